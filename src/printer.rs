use log::{debug, info};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::Duration,
};

use crate::{
    error::{Error, WriteError},
    model::PrinterId,
    raster::RESET,
};

/// Upper bound for a single bulk write. libusb treats zero as "wait forever",
/// so a zero timeout is replaced by this value.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can take a command buffer and put it on paper.
pub trait Transport: Send + Sync {
    fn transmit(&self, buf: &[u8]) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    config: u8,
    iface: u8,
    setting: u8,
    address: u8,
}

/// Which printer to open and how long a single write may block.
#[derive(Debug, Clone)]
pub struct Config {
    printer: PrinterId,
    write_timeout: Duration,
}

impl Config {
    pub fn new(printer: PrinterId) -> Config {
        Config {
            printer,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn write_timeout(self, timeout: Duration) -> Self {
        let write_timeout = if timeout.is_zero() {
            DEFAULT_WRITE_TIMEOUT
        } else {
            timeout
        };
        Config {
            write_timeout,
            ..self
        }
    }

    pub fn printer(&self) -> PrinterId {
        self.printer
    }

    pub fn timeout(&self) -> Duration {
        self.write_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PrinterId::default())
    }
}

/// USB printer reached through libusb.
///
/// Holds no device state between jobs. Every [`Transport::transmit`] call
/// opens a fresh context, finds and claims the printer, writes, and releases
/// everything again before returning.
#[derive(Debug, Clone)]
pub struct Printer {
    config: Config,
}

impl Printer {
    pub fn new(config: Config) -> Self {
        Printer { config }
    }

    pub fn id(&self) -> PrinterId {
        self.config.printer
    }

    fn open_device<T: UsbContext>(
        context: &T,
        id: PrinterId,
    ) -> Result<(Device<T>, DeviceDescriptor), Error> {
        let devices = context.devices()?;

        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };
            debug!("{:?}", device_desc);

            // Several matching printers are not told apart, the first one wins.
            if id.matches(device_desc.vendor_id(), device_desc.product_id()) {
                return Ok((device, device_desc));
            }
        }
        debug!("No device match with id {}", id);
        Err(Error::DeviceNotFound(id))
    }

    /// Every bulk OUT endpoint on the device, in descriptor order.
    fn bulk_out_endpoints<T: UsbContext>(
        device: &Device<T>,
        device_desc: &DeviceDescriptor,
    ) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();

        for n in 0..device_desc.num_configurations() {
            let config_desc = match device.config_descriptor(n) {
                Ok(c) => c,
                Err(err) => {
                    debug!("config descriptor {}: {:?}", n, err);
                    continue;
                }
            };
            for interface in config_desc.interfaces() {
                for interface_desc in interface.descriptors() {
                    let out = interface_desc.endpoint_descriptors().filter(|endpoint_desc| {
                        endpoint_desc.direction() == Direction::Out
                            && endpoint_desc.transfer_type() == TransferType::Bulk
                    });
                    for endpoint_desc in out {
                        endpoints.push(Endpoint {
                            config: config_desc.number(),
                            iface: interface_desc.interface_number(),
                            setting: interface_desc.setting_number(),
                            address: endpoint_desc.address(),
                        });
                    }
                }
            }
        }
        endpoints
    }
}

/// Pick the data channel: endpoint 1 OUT on interface 0 when the device has
/// it, else the first bulk OUT on interface 0, else the first one anywhere.
fn choose_endpoint(candidates: &[Endpoint]) -> Option<Endpoint> {
    candidates
        .iter()
        .find(|e| e.iface == 0 && e.address == PRIMARY_OUT_ADDRESS)
        .or_else(|| candidates.iter().find(|e| e.iface == 0))
        .or_else(|| candidates.first())
        .copied()
}

/// Address of endpoint number 1, host to device.
const PRIMARY_OUT_ADDRESS: u8 = 0x01;

impl Transport for Printer {
    /// Send the reset command followed by `buf` in two blocking bulk writes.
    ///
    /// Concurrent calls for the same printer are serialized. Nothing is
    /// retried; the interface is released on every exit path.
    fn transmit(&self, buf: &[u8]) -> Result<(), Error> {
        let id = self.config.printer;
        let lock = device_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let context = Context::new()?;
        let (device, device_desc) = Self::open_device(&context, id)?;

        let endpoint = choose_endpoint(&Self::bulk_out_endpoints(&device, &device_desc))
            .ok_or(Error::MissingEndpoint)?;
        debug!("{:?}", endpoint);

        let handle = device.open()?;
        info!("printer {} connected", id);

        let session = Session::claim(handle, endpoint, self.config.write_timeout)?;
        session.send(buf)?;

        info!("sent {} bytes to printer {}", buf.len(), id);
        Ok(())
    }
}

/// The calls a session makes on a claimed device handle.
trait Claimed {
    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize>;
    fn release_interface(&mut self, iface: u8) -> rusb::Result<()>;
}

impl<T: UsbContext> Claimed for DeviceHandle<T> {
    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_bulk(self, endpoint, buf, timeout)
    }

    fn release_interface(&mut self, iface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, iface)
    }
}

/// A claimed interface on an open device. Dropping it releases the claim,
/// then the handle closes itself.
struct Session<H: Claimed> {
    handle: H,
    endpoint: Endpoint,
    timeout: Duration,
}

impl<T: UsbContext> Session<DeviceHandle<T>> {
    fn claim(
        mut handle: DeviceHandle<T>,
        endpoint: Endpoint,
        timeout: Duration,
    ) -> Result<Self, Error> {
        // Not available on every platform, the claim below reports the real problem.
        if let Err(err) = handle.set_auto_detach_kernel_driver(true) {
            debug!("auto detach kernel driver: {:?}", err);
        }

        if handle.active_configuration().ok() != Some(endpoint.config) {
            handle
                .set_active_configuration(endpoint.config)
                .map_err(Error::InterfaceClaimError)?;
        }
        handle
            .claim_interface(endpoint.iface)
            .map_err(Error::InterfaceClaimError)?;

        let mut session = Session {
            handle,
            endpoint,
            timeout,
        };
        session
            .handle
            .set_alternate_setting(endpoint.iface, endpoint.setting)
            .map_err(Error::InterfaceClaimError)?;

        Ok(session)
    }
}

impl<H: Claimed> Session<H> {
    /// Reset the printer, then write the command buffer.
    fn send(&self, buf: &[u8]) -> Result<(), Error> {
        self.write(&RESET)?;
        self.write(buf)?;
        Ok(())
    }

    fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        let result = self
            .handle
            .write_bulk(self.endpoint.address, buf, self.timeout);
        check_written(result, buf.len())
    }
}

impl<H: Claimed> Drop for Session<H> {
    fn drop(&mut self) {
        if let Err(err) = self.handle.release_interface(self.endpoint.iface) {
            debug!("release interface {}: {:?}", self.endpoint.iface, err);
        }
    }
}

/// A bulk write only counts when every byte went out.
fn check_written(result: rusb::Result<usize>, expected: usize) -> Result<usize, Error> {
    match result {
        Ok(n) if n == expected => Ok(n),
        Ok(n) => {
            debug!(
                "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                n, expected
            );
            Err(Error::TransmissionError(WriteError::Short {
                written: n,
                expected,
            }))
        }
        Err(e) => Err(Error::TransmissionError(WriteError::Usb(e))),
    }
}

/// Process-wide lock for one physical printer.
///
/// Poisoning is ignored: the guarded state is the device itself, which a
/// panicking job leaves no worse than a failed write does.
fn device_lock(id: PrinterId) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PrinterId, Arc<Mutex<()>>>>> = OnceLock::new();

    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.entry(id).or_default().clone()
}
