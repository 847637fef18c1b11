//! Recording engine used by the unit tests.

use crate::engine::Engine;
use crate::types::{EngineResult, Operation, PixelBuffer, PixelFormat};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Init(String),
    WarmUp(PixelFormat),
    Process {
        format: PixelFormat,
        width: u32,
        height: u32,
        stride: u32,
        len: usize,
        exif_orientation: i32,
    },
    ProcessEncoded(usize),
    ExifOrientation(usize),
    RuntimeLicenseKey(bool),
    DeInit,
}

pub(crate) type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Default)]
pub(crate) struct MockEngine {
    calls: CallLog,
    fail_on: Option<Operation>,
    orientation: Option<i32>,
}

impl MockEngine {
    pub(crate) fn failing(operation: Operation) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    pub(crate) fn with_orientation(orientation: i32) -> Self {
        Self {
            orientation: Some(orientation),
            ..Self::default()
        }
    }

    /// Shared view of the call log; stays valid after the engine is moved.
    pub(crate) fn calls(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    fn respond(&self, operation: Operation, call: Call) -> EngineResult {
        self.calls.borrow_mut().push(call);
        if self.fail_on == Some(operation) {
            EngineResult::failure(
                -1,
                "mock failure",
                format!(r#"{{"operation":"{operation}","status":"failed"}}"#),
            )
        } else {
            EngineResult::ok(format!(r#"{{"operation":"{operation}","status":"ok","faces":[]}}"#))
        }
    }
}

impl Engine for MockEngine {
    fn init(&mut self, config_json: &str) -> EngineResult {
        self.respond(Operation::Init, Call::Init(config_json.to_string()))
    }

    fn warm_up(&mut self, format: PixelFormat) -> EngineResult {
        self.respond(Operation::WarmUp, Call::WarmUp(format))
    }

    fn process(&mut self, frame: &PixelBuffer, exif_orientation: i32) -> EngineResult {
        self.respond(
            Operation::Process,
            Call::Process {
                format: frame.format(),
                width: frame.width(),
                height: frame.height(),
                stride: frame.stride(),
                len: frame.data().len(),
                exif_orientation,
            },
        )
    }

    fn process_encoded(&mut self, data: &[u8]) -> EngineResult {
        self.respond(Operation::Process, Call::ProcessEncoded(data.len()))
    }

    fn exif_orientation(&self, jpeg: &[u8]) -> i32 {
        self.calls
            .borrow_mut()
            .push(Call::ExifOrientation(jpeg.len()));
        self.orientation.unwrap_or(1)
    }

    fn request_runtime_license_key(&mut self, raw: bool) -> EngineResult {
        self.respond(Operation::RuntimeLicenseKey, Call::RuntimeLicenseKey(raw))
    }

    fn deinit(&mut self) -> EngineResult {
        self.respond(Operation::DeInit, Call::DeInit)
    }
}
