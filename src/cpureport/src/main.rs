#![no_std]
#![no_main]

#[macro_use]
extern crate log;
extern crate alloc;

mod report;
mod session;

use cpufeat::{label, LeafSnapshot, ReportLine, FEATURES};
use report::Reporter;
use session::Session;
use uefi::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(debug_assertions)]
fn configure_log_level() {
    log::set_max_level(log::LevelFilter::Debug);
}

#[cfg(not(debug_assertions))]
fn configure_log_level() {
    log::set_max_level(log::LevelFilter::Info);
}

#[entry]
fn efi_main(image_handle: Handle, mut system_table: SystemTable<Boot>) -> Status {
    if let Err(error) = uefi_services::init(&mut system_table) {
        return error.status();
    }
    configure_log_level();
    info!("Loaded cpureport v{}.", VERSION);

    let mut session = Session::new(image_handle, system_table);
    session.print("When you press any key, the system will reboot.\n\n");

    let mut reporter = Reporter::open(&mut session);

    let vendor = session.firmware_vendor();
    let revision = session.firmware_revision();
    let (major, minor) = session.uefi_version();

    reporter.emit(&mut session, &ReportLine::text_field("Firmware Vendor", &vendor));
    reporter.emit(&mut session, &ReportLine::hex_field("Firmware Revision", revision));
    reporter.emit(&mut session, &ReportLine::version_field("UEFI Version", major, minor));

    // One query per leaf; entries sharing a leaf are contiguous in the table.
    let mut current: Option<(u32, LeafSnapshot)> = None;
    for feature in &FEATURES {
        let snapshot = match current {
            Some((leaf, snapshot)) if leaf == feature.leaf => snapshot,
            _ => {
                let snapshot = LeafSnapshot::query(feature.leaf);
                current = Some((feature.leaf, snapshot));
                snapshot
            }
        };
        let state = label(snapshot.bit(feature.register, feature.bit));
        reporter.emit(&mut session, &ReportLine::text_field(feature.name, state));
    }

    reporter.close();

    session.reboot(Status::SUCCESS)
}
