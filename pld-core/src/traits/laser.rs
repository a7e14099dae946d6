//! Laser output trait

pub use pld_protocol::LaserLine;

/// Digital outputs of the laser subsystem
///
/// The relay line is inverted with respect to power: driving it high
/// disconnects the laser supply.
pub trait LaserIo {
    /// Drive a line high or low
    fn set(&mut self, line: LaserLine, high: bool);

    /// Last level written to a line
    fn get(&self, line: LaserLine) -> bool;
}
