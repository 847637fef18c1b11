//! Ordered, status-checked access to an [`Engine`].

use crate::engine::Engine;
use crate::types::{EngineResult, Operation, PixelBuffer, PixelFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{operation}: Execution failed: {json}")]
    EngineCallFailed {
        operation: Operation,
        code: i32,
        phrase: String,
        json: String,
    },
    #[error("{operation} called out of order (session is {stage:?})")]
    OutOfOrder { operation: Operation, stage: Stage },
}

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Initialized,
    WarmedUp,
    Closed,
}

/// One pass through init → warmUp → process → deInit.
///
/// Every engine status is checked; a failed call is returned as
/// [`SessionError::EngineCallFailed`] and nothing else is sent to the engine.
pub struct Session<E: Engine> {
    engine: E,
    stage: Stage,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn init(&mut self, config_json: &str) -> Result<EngineResult, SessionError> {
        self.require_stage(Operation::Init, &[Stage::Idle])?;
        let result = check(Operation::Init, self.engine.init(config_json))?;
        self.stage = Stage::Initialized;
        Ok(result)
    }

    pub fn warm_up(&mut self, format: PixelFormat) -> Result<EngineResult, SessionError> {
        self.require_stage(Operation::WarmUp, &[Stage::Initialized])?;
        let result = check(Operation::WarmUp, self.engine.warm_up(format))?;
        self.stage = Stage::WarmedUp;
        Ok(result)
    }

    /// May be repeated once warmed up.
    pub fn process(
        &mut self,
        frame: &PixelBuffer,
        exif_orientation: i32,
    ) -> Result<EngineResult, SessionError> {
        self.require_stage(Operation::Process, &[Stage::WarmedUp])?;
        check(Operation::Process, self.engine.process(frame, exif_orientation))
    }

    pub fn process_encoded(&mut self, data: &[u8]) -> Result<EngineResult, SessionError> {
        self.require_stage(Operation::Process, &[Stage::WarmedUp])?;
        check(Operation::Process, self.engine.process_encoded(data))
    }

    pub fn request_runtime_license_key(&mut self, raw: bool) -> Result<EngineResult, SessionError> {
        self.require_stage(
            Operation::RuntimeLicenseKey,
            &[Stage::Initialized, Stage::WarmedUp],
        )?;
        check(
            Operation::RuntimeLicenseKey,
            self.engine.request_runtime_license_key(raw),
        )
    }

    pub fn exif_orientation(&self, jpeg: &[u8]) -> i32 {
        self.engine.exif_orientation(jpeg)
    }

    /// Ends the session. The session is closed even when the engine
    /// reports failure.
    pub fn deinit(&mut self) -> Result<EngineResult, SessionError> {
        self.require_stage(Operation::DeInit, &[Stage::Initialized, Stage::WarmedUp])?;
        self.stage = Stage::Closed;
        check(Operation::DeInit, self.engine.deinit())
    }

    fn require_stage(&self, operation: Operation, allowed: &[Stage]) -> Result<(), SessionError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(SessionError::OutOfOrder {
                operation,
                stage: self.stage,
            })
        }
    }
}

fn check(operation: Operation, result: EngineResult) -> Result<EngineResult, SessionError> {
    if result.is_ok() {
        tracing::debug!(%operation, "engine call ok");
        return Ok(result);
    }
    tracing::error!(
        %operation,
        code = result.code,
        phrase = %result.phrase,
        json = %result.json,
        "engine call failed"
    );
    Err(SessionError::EngineCallFailed {
        operation,
        code: result.code,
        phrase: result.phrase,
        json: result.json,
    })
}
