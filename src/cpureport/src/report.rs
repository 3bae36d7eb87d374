use crate::session::Session;
use cpufeat::ReportLine;
use uefi::{
    prelude::*,
    proto::media::{
        file::{File, FileAttribute, FileMode, RegularFile},
        fs::SimpleFileSystem,
    },
    CStr16,
};

pub const REPORT_PATH: &CStr16 = cstr16!("\\result.txt");

/// Dual-target report emitter. Every line goes to the console immediately;
/// the file copy is written when a report file is open. A missing file
/// skips the file write only, so console reporting continues best-effort.
pub struct Reporter {
    file: Option<RegularFile>,
}

impl Reporter {
    /// Opens the report file on the boot volume. Every firmware failure on
    /// this path is fatal and routes through the session's fail path.
    pub fn open(session: &mut Session) -> Self {
        match open_report_file(session.boot_services(), session.device(), REPORT_PATH) {
            Ok(file) => Self { file: Some(file) },
            Err(error) => session.fail(error.context, Some(error.status)),
        }
    }

    pub fn emit(&mut self, session: &mut Session, line: &ReportLine) {
        session.print(&line.console_form());

        if let Some(file) = self.file.as_mut() {
            if let Err(error) = file.write(&line.file_form()) {
                session.fail("Write() failed.", Some(error.status()));
            }
        }
    }

    pub fn close(self) {
        if let Some(file) = self.file {
            file.close();
        }
    }
}

struct FirmwareError {
    context: &'static str,
    status: Status,
}

impl FirmwareError {
    fn new<Data: core::fmt::Debug>(context: &'static str, error: uefi::Error<Data>) -> Self {
        Self { context, status: error.status() }
    }
}

fn open_report_file(
    boot_services: &BootServices,
    device: Handle,
    path: &CStr16,
) -> Result<RegularFile, FirmwareError> {
    let mut file_system = boot_services
        .open_protocol_exclusive::<SimpleFileSystem>(device)
        .map_err(|error| FirmwareError::new("OpenProtocol() FileSystemProtocol failed.", error))?;

    let mut root = file_system
        .open_volume()
        .map_err(|error| FirmwareError::new("OpenVolume() failed.", error))?;

    // Truncate-on-create: a report surviving from a prior run is deleted so
    // every run starts from byte zero.
    if let Ok(previous) = root.open(path, FileMode::Read, FileAttribute::empty()) {
        let _ = previous.delete();
    }

    let handle = root
        .open(path, FileMode::CreateReadWrite, FileAttribute::ARCHIVE)
        .map_err(|error| FirmwareError::new("Open() failed.", error))?;
    let file = handle.into_regular_file().ok_or(FirmwareError {
        context: "Open() failed.",
        status: Status::INVALID_PARAMETER,
    })?;

    // The root volume handle closes on drop here; the report file stays open.
    Ok(file)
}
