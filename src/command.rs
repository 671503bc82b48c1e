//! Command sets spoken on the I2C side (bridge) and the 1-Wire side (ROM).

pub trait OpCode {
    fn op_code(&self) -> u8;
}

macro_rules! op_code {
    ($($name:ident),+) => {
        $(impl OpCode for $name {
            fn op_code(&self) -> u8 {
                *self as _
            }
        })+
    };
}

/// 1-Wire ROM commands, addressed to every slave after a bus reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    SearchRom = 0xF0,
    ReadRom = 0x33,
    MatchRom = 0x55,
    SkipRom = 0xCC,
    SearchRomAlarmed = 0xEC,
}

/// DS2482 function commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BridgeCommand {
    DeviceReset = 0xF0,
    SetReadPointer = 0xE1,
    WriteConfiguration = 0xD2,
    ChannelReset = 0xB4,
    SingleBit = 0x87,
    WriteByte = 0xA5,
    ReadByte = 0x96,
    Triplet = 0x78,
}

/// DS2482 register selectors for [`BridgeCommand::SetReadPointer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Status = 0xF0,
    ReadData = 0xE1,
    Configuration = 0xC3,
}

op_code!(Command, BridgeCommand, Register);
