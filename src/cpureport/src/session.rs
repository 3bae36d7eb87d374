use alloc::string::{String, ToString};
use core::fmt::Write;
use uefi::{
    prelude::*,
    proto::{console::text::Input, loaded_image::LoadedImage},
    table::runtime::ResetType,
};

/// One-time handshake with the hosting firmware. Owns the system table and
/// the device handle of the volume the image was loaded from; every
/// downstream component reaches firmware services through it.
pub struct Session {
    system_table: SystemTable<Boot>,
    device: Handle,
}

impl Session {
    /// Establishes the session: resets console input and resolves the boot
    /// device through the loaded-image protocol. Any failure routes through
    /// the universal fail path and does not return.
    pub fn new(image_handle: Handle, mut system_table: SystemTable<Boot>) -> Self {
        if let Err(error) = system_table.stdin().reset(false) {
            fail_and_reset(&mut system_table, "Input device unavailable.", Some(error.status()));
        }

        let device = match locate_boot_device(&system_table, image_handle) {
            Ok(Some(device)) => device,
            Ok(None) => fail_and_reset(
                &mut system_table,
                "OpenProtocol() LoadedImageProtocol failed.",
                None,
            ),
            Err(error) => fail_and_reset(
                &mut system_table,
                "OpenProtocol() LoadedImageProtocol failed.",
                Some(error.status()),
            ),
        };

        Self { system_table, device }
    }

    /// Handle of the device hosting the running image's filesystem.
    pub fn device(&self) -> Handle {
        self.device
    }

    pub fn boot_services(&self) -> &BootServices {
        self.system_table.boot_services()
    }

    pub fn firmware_vendor(&self) -> String {
        self.system_table.firmware_vendor().to_string()
    }

    pub fn firmware_revision(&self) -> u32 {
        self.system_table.firmware_revision()
    }

    /// (major, minor) pair of the packed system-table revision.
    pub fn uefi_version(&self) -> (u32, u32) {
        cpufeat::split_revision(self.system_table.uefi_revision().0)
    }

    pub fn print(&mut self, text: &str) {
        let _ = self.system_table.stdout().write_str(text);
    }

    /// Universal error exit: report the failure, wait for a keystroke, cold
    /// reset. The reset status is SUCCESS regardless of the trigger.
    pub fn fail(&mut self, message: &str, status: Option<Status>) -> ! {
        fail_and_reset(&mut self.system_table, message, status)
    }

    /// Blocks for one keystroke, then cold-resets the machine.
    pub fn reboot(&mut self, status: Status) -> ! {
        await_keystroke(self.system_table.stdin());
        self.system_table.runtime_services().reset(ResetType::COLD, status, None)
    }
}

fn locate_boot_device(
    system_table: &SystemTable<Boot>,
    image_handle: Handle,
) -> uefi::Result<Option<Handle>> {
    let loaded_image = system_table
        .boot_services()
        .open_protocol_exclusive::<LoadedImage>(image_handle)?;
    Ok(loaded_image.device())
}

fn fail_and_reset(
    system_table: &mut SystemTable<Boot>,
    message: &str,
    status: Option<Status>,
) -> ! {
    error!("{}", message);
    if let Some(status) = status {
        error!("EFI_STATUS = {:#x}, {:?}", status.0, status);
    }

    await_keystroke(system_table.stdin());
    system_table.runtime_services().reset(ResetType::COLD, Status::SUCCESS, None)
}

/// Spins on the non-blocking key read until a key arrives. Unbounded; only
/// physical input ends the wait.
fn await_keystroke(stdin: &mut Input) {
    while !matches!(stdin.read_key(), Ok(Some(_))) {
        core::hint::spin_loop();
    }
}
