//! Register definitions and register access for the LSM303D
//!
//! The LSM303D exposes a single flat register space shared by the
//! accelerometer, the magnetometer and the temperature sensor. Bit-exact
//! handling matters for the control registers that govern scale, rate and
//! enable bits, and for the axis output registers. Every other address is
//! passed through unchanged for diagnostics.

use device_driver::RegisterInterface;

/// LSM303D register addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Undocumented I2C interface control 1
    I2cControl1 = 0x02,
    /// Temperature output, low byte
    OutTempL = 0x05,
    /// Temperature output, high byte
    OutTempH = 0x06,
    /// Magnetometer status
    StatusM = 0x07,
    /// Magnetometer X output, low byte
    OutXLM = 0x08,
    /// Magnetometer X output, high byte
    OutXHM = 0x09,
    /// Magnetometer Y output, low byte
    OutYLM = 0x0A,
    /// Magnetometer Y output, high byte
    OutYHM = 0x0B,
    /// Magnetometer Z output, low byte
    OutZLM = 0x0C,
    /// Magnetometer Z output, high byte
    OutZHM = 0x0D,
    /// Device identification (reads 0x49)
    WhoAmI = 0x0F,
    /// Magnetic interrupt control
    IntCtrlM = 0x12,
    /// Magnetic interrupt source
    IntSrcM = 0x13,
    /// Undocumented I2C interface control 2
    I2cControl2 = 0x15,
    /// High-pass filter reference, X
    ReferenceX = 0x1C,
    /// High-pass filter reference, Y
    ReferenceY = 0x1D,
    /// High-pass filter reference, Z
    ReferenceZ = 0x1E,
    /// Boot, FIFO and high-pass configuration
    Ctrl0 = 0x1F,
    /// Accelerometer data rate, block data update and axis enables
    Ctrl1 = 0x20,
    /// Accelerometer anti-alias bandwidth and full scale
    Ctrl2 = 0x21,
    /// INT1 routing
    Ctrl3 = 0x22,
    /// INT2 routing
    Ctrl4 = 0x23,
    /// Temperature enable, magnetometer resolution and data rate
    Ctrl5 = 0x24,
    /// Magnetometer full scale
    Ctrl6 = 0x25,
    /// Magnetometer mode and filtering
    Ctrl7 = 0x26,
    /// Accelerometer status
    StatusA = 0x27,
    /// Accelerometer X output, low byte
    OutXLA = 0x28,
    /// Accelerometer X output, high byte
    OutXHA = 0x29,
    /// Accelerometer Y output, low byte
    OutYLA = 0x2A,
    /// Accelerometer Y output, high byte
    OutYHA = 0x2B,
    /// Accelerometer Z output, low byte
    OutZLA = 0x2C,
    /// Accelerometer Z output, high byte
    OutZHA = 0x2D,
    /// FIFO control
    FifoCtrl = 0x2E,
    /// FIFO source
    FifoSrc = 0x2F,
    /// Inertial interrupt generator 1 configuration
    IgCfg1 = 0x30,
    /// Inertial interrupt generator 1 source
    IgSrc1 = 0x31,
    /// Inertial interrupt generator 1 threshold
    IgThs1 = 0x32,
    /// Inertial interrupt generator 1 duration
    IgDur1 = 0x33,
    /// Inertial interrupt generator 2 configuration
    IgCfg2 = 0x34,
    /// Inertial interrupt generator 2 source
    IgSrc2 = 0x35,
    /// Inertial interrupt generator 2 threshold
    IgThs2 = 0x36,
    /// Inertial interrupt generator 2 duration
    IgDur2 = 0x37,
    /// Click configuration
    ClickCfg = 0x38,
    /// Click source
    ClickSrc = 0x39,
    /// Click threshold
    ClickThs = 0x3A,
    /// Click time limit
    TimeLimit = 0x3B,
    /// Click time latency
    TimeLatency = 0x3C,
    /// Click time window
    TimeWindow = 0x3D,
    /// Sleep-to-wake activation threshold
    ActThs = 0x3E,
    /// Sleep-to-wake duration
    ActDur = 0x3F,
}

impl Register {
    /// Register address on the bus
    #[must_use]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Datasheet name of the register
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I2cControl1 => "I2C_CONTROL1",
            Self::OutTempL => "TEMP_L",
            Self::OutTempH => "TEMP_H",
            Self::StatusM => "STATUS_M",
            Self::OutXLM => "MAG_XL",
            Self::OutXHM => "MAG_XH",
            Self::OutYLM => "MAG_YL",
            Self::OutYHM => "MAG_YH",
            Self::OutZLM => "MAG_ZL",
            Self::OutZHM => "MAG_ZH",
            Self::WhoAmI => "WHO_AM_I",
            Self::IntCtrlM => "INT_CTRL_M",
            Self::IntSrcM => "INT_SRC_M",
            Self::I2cControl2 => "I2C_CONTROL2",
            Self::ReferenceX => "REFERENCE_X",
            Self::ReferenceY => "REFERENCE_Y",
            Self::ReferenceZ => "REFERENCE_Z",
            Self::Ctrl0 => "CTRL_REG0",
            Self::Ctrl1 => "CTRL_REG1",
            Self::Ctrl2 => "CTRL_REG2",
            Self::Ctrl3 => "CTRL_REG3",
            Self::Ctrl4 => "CTRL_REG4",
            Self::Ctrl5 => "CTRL_REG5",
            Self::Ctrl6 => "CTRL_REG6",
            Self::Ctrl7 => "CTRL_REG7",
            Self::StatusA => "STATUS_A",
            Self::OutXLA => "ACCEL_XL",
            Self::OutXHA => "ACCEL_XH",
            Self::OutYLA => "ACCEL_YL",
            Self::OutYHA => "ACCEL_YH",
            Self::OutZLA => "ACCEL_ZL",
            Self::OutZHA => "ACCEL_ZH",
            Self::FifoCtrl => "FIFO_CTRL",
            Self::FifoSrc => "FIFO_SRC",
            Self::IgCfg1 => "IG_CFG1",
            Self::IgSrc1 => "IG_SRC1",
            Self::IgThs1 => "IG_THS1",
            Self::IgDur1 => "IG_DUR1",
            Self::IgCfg2 => "IG_CFG2",
            Self::IgSrc2 => "IG_SRC2",
            Self::IgThs2 => "IG_THS2",
            Self::IgDur2 => "IG_DUR2",
            Self::ClickCfg => "CLICK_CFG",
            Self::ClickSrc => "CLICK_SRC",
            Self::ClickThs => "CLICK_THS",
            Self::TimeLimit => "TIME_LIMIT",
            Self::TimeLatency => "TIME_LATENCY",
            Self::TimeWindow => "TIME_WINDOW",
            Self::ActThs => "ACT_THS",
            Self::ActDur => "ACT_DUR",
        }
    }
}

/// CTRL1: X axis enable
pub const CTRL1_X_ENABLE: u8 = 1 << 0;
/// CTRL1: Y axis enable
pub const CTRL1_Y_ENABLE: u8 = 1 << 1;
/// CTRL1: Z axis enable
pub const CTRL1_Z_ENABLE: u8 = 1 << 2;
/// CTRL1: block data update (output registers latch until both bytes are read)
pub const CTRL1_BDU: u8 = 1 << 3;
/// CTRL1: enable bits written on every re-initialization
pub const CTRL1_DEFAULT_ENABLE: u8 = CTRL1_X_ENABLE | CTRL1_Y_ENABLE | CTRL1_Z_ENABLE | CTRL1_BDU;

/// CTRL3: accelerometer data-ready on INT1
pub const CTRL3_DRDY_ACCEL_INT1: u8 = 0x04;
/// CTRL4: magnetometer data-ready on INT2
pub const CTRL4_DRDY_MAG_INT2: u8 = 0x04;

/// CTRL5: high magnetometer resolution
pub const CTRL5_MAG_RES_HIGH: u8 = (1 << 6) | (1 << 5);

/// CTRL7: continuous-conversion magnetometer mode
pub const CTRL7_MAG_CONTINUOUS: u8 = 0x00;

/// Registers captured by a diagnostic dump, in dump order
pub const DIAGNOSTIC_REGISTERS: [Register; 53] = [
    Register::WhoAmI,
    Register::I2cControl1,
    Register::I2cControl2,
    Register::StatusA,
    Register::StatusM,
    Register::Ctrl0,
    Register::Ctrl1,
    Register::Ctrl2,
    Register::Ctrl3,
    Register::Ctrl4,
    Register::Ctrl5,
    Register::Ctrl6,
    Register::Ctrl7,
    Register::OutTempL,
    Register::OutTempH,
    Register::IntCtrlM,
    Register::IntSrcM,
    Register::ReferenceX,
    Register::ReferenceY,
    Register::ReferenceZ,
    Register::OutXLA,
    Register::OutXHA,
    Register::OutYLA,
    Register::OutYHA,
    Register::OutZLA,
    Register::OutZHA,
    Register::FifoCtrl,
    Register::FifoSrc,
    Register::IgCfg1,
    Register::IgSrc1,
    Register::IgThs1,
    Register::IgDur1,
    Register::IgCfg2,
    Register::IgSrc2,
    Register::IgThs2,
    Register::IgDur2,
    Register::ClickCfg,
    Register::ClickSrc,
    Register::ClickThs,
    Register::TimeLimit,
    Register::TimeLatency,
    Register::TimeWindow,
    Register::ActThs,
    Register::ActDur,
    Register::OutXLM,
    Register::OutXHM,
    Register::OutYLM,
    Register::OutYHM,
    Register::OutZLM,
    Register::OutZHM,
    // Interface registers again, to catch changes during the dump
    Register::I2cControl1,
    Register::I2cControl2,
    Register::WhoAmI,
];

/// Typed register access over a bus transport
///
/// Every call is one blocking bus transaction (two for [`modify`](Self::modify)).
/// Nothing is retried here; transport errors go straight back to the caller.
pub struct Registers<I> {
    interface: I,
}

impl<I> Registers<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Wrap a bus transport
    pub const fn new(interface: I) -> Self {
        Self { interface }
    }

    /// Read one register
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus exchange fails.
    pub fn read(&mut self, register: Register) -> Result<u8, I::Error> {
        self.read_addr(register.addr())
    }

    /// Write one register
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus exchange fails.
    pub fn write(&mut self, register: Register, value: u8) -> Result<(), I::Error> {
        self.write_addr(register.addr(), value)
    }

    /// Read-modify-write a register: `clear` bits are cleared before `set` bits are set
    ///
    /// # Errors
    ///
    /// Returns the transport error if either bus exchange fails.
    pub fn modify(&mut self, register: Register, clear: u8, set: u8) -> Result<(), I::Error> {
        let value = self.read(register)?;
        self.write(register, (value & !clear) | set)
    }

    /// Read consecutive registers starting at `register` in one transaction
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus exchange fails.
    pub fn read_burst(&mut self, register: Register, buffer: &mut [u8]) -> Result<(), I::Error> {
        let size_bits = u32::try_from(buffer.len() * 8).unwrap_or(u32::MAX);
        self.interface
            .read_register(register.addr(), size_bits, buffer)
    }

    /// Read a raw address, including ones outside [`Register`]
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus exchange fails.
    pub fn read_addr(&mut self, address: u8) -> Result<u8, I::Error> {
        let mut value = [0u8; 1];
        self.interface.read_register(address, 8, &mut value)?;
        Ok(value[0])
    }

    /// Write a raw address, including ones outside [`Register`]
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus exchange fails.
    pub fn write_addr(&mut self, address: u8, value: u8) -> Result<(), I::Error> {
        self.interface.write_register(address, 8, &[value])
    }

    /// Consume the wrapper and return the transport
    pub fn release(self) -> I {
        self.interface
    }
}
