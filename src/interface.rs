//! Bus interface implementation for the LSM303D
//!
//! This module provides the `device-driver` register interface for SPI
//! communication with the LSM303D.

use device_driver::RegisterInterface;

/// Read/write direction bit of the SPI command byte
const DIR_READ: u8 = 1 << 7;

/// Address auto-increment bit of the SPI command byte (multi-byte transfers)
const ADDR_INCREMENT: u8 = 1 << 6;

/// Largest single write transfer (register data bytes); longer writes are split
const MAX_WRITE_LEN: usize = 16;

/// SPI transport for the LSM303D
///
/// Chip select belongs to the [`SpiDevice`](embedded_hal::spi::SpiDevice);
/// each register access is a framed transaction of command byte plus data,
/// with writes above 16 bytes split across transfers. A bus shared with
/// other sensors is typically wrapped with `embedded-hal-bus`:
///
/// ```ignore
/// let device = embedded_hal_bus::spi::RefCellDevice::new(&bus, lsm_cs, delay)?;
/// let imu = Lsm303d::new(SpiInterface::new(device), drdy, timer, ())?;
/// ```
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Create a new SPI interface with the given SPI device
    ///
    /// The device must be configured for SPI mode 3. The LSM303D accepts
    /// clocks up to 10 MHz.
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume the interface and return the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

/// Build the command byte for a transfer of `len` data bytes
const fn command(address: u8, read: bool, len: usize) -> u8 {
    let mut cmd = address & 0x3F;
    if read {
        cmd |= DIR_READ;
    }
    if len > 1 {
        cmd |= ADDR_INCREMENT;
    }
    cmd
}

impl<SPI, E> RegisterInterface for SpiInterface<SPI>
where
    SPI: embedded_hal::spi::SpiDevice<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits;
        let cmd = command(address, true, read_data.len());

        let mut operations = [
            embedded_hal::spi::Operation::Write(&[cmd]),
            embedded_hal::spi::Operation::Read(read_data),
        ];

        self.spi.transaction(&mut operations)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits;
        let mut buffer = [0u8; MAX_WRITE_LEN + 1];

        // Longer payloads continue at the next register in a new transfer
        for (index, chunk) in write_data.chunks(MAX_WRITE_LEN).enumerate() {
            let start = address.wrapping_add((index * MAX_WRITE_LEN) as u8);
            let len = chunk.len();
            buffer[0] = command(start, false, len);
            buffer[1..=len].copy_from_slice(chunk);
            self.spi.write(&buffer[..=len])?;
        }

        Ok(())
    }
}
