use crate::constants::MAX_POLY;
use crate::params::N_MOD_INPUTS;

pub const INPUT_L: usize = 0;
pub const INPUT_R: usize = 1;
pub const VCF_MOD_INPUT: usize = 2;
pub const NUM_INPUTS: usize = VCF_MOD_INPUT + N_MOD_INPUTS;

pub const OUTPUT_L: usize = 0;
pub const OUTPUT_R: usize = 1;
pub const NUM_OUTPUTS: usize = 2;

/// A polyphonic cable end: up to `MAX_POLY` voltages plus a channel count.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyPort {
    connected: bool,
    channels: usize,
    voltages: [f32; MAX_POLY],
}

impl PolyPort {
    pub fn new() -> Self {
        Self {
            connected: false,
            channels: 0,
            voltages: [0.0; MAX_POLY],
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Plug or unplug the cable. Unplugging drops the channel count to 0.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if !connected {
            self.channels = 0;
        }
    }

    /// Connect with `channels` voices.
    pub fn connect(&mut self, channels: usize) {
        self.connected = true;
        self.set_channels(channels);
    }

    pub fn channels(&self) -> usize {
        if self.connected {
            self.channels
        } else {
            0
        }
    }

    pub fn set_channels(&mut self, channels: usize) {
        let channels = channels.min(MAX_POLY);
        // channels that go away read back as silence
        for v in self.voltages[channels..].iter_mut() {
            *v = 0.0;
        }
        self.channels = channels;
    }

    /// Polyphony as the allocator sees it: `None` when unplugged.
    pub fn polyphony(&self) -> Option<usize> {
        self.connected.then_some(self.channels)
    }

    /// Voltage of `channel`, 0 outside the active channel range.
    pub fn voltage(&self, channel: usize) -> f32 {
        if channel < self.channels() {
            self.voltages[channel]
        } else {
            0.0
        }
    }

    pub fn set_voltage(&mut self, value: f32, channel: usize) {
        if channel < MAX_POLY {
            self.voltages[channel] = value;
        }
    }

    pub fn voltages(&self) -> &[f32] {
        &self.voltages[..self.channels]
    }

    pub fn clear(&mut self) {
        self.voltages = [0.0; MAX_POLY];
    }
}

impl Default for PolyPort {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_port_reads_silence() {
        let mut port = PolyPort::new();
        port.set_voltage(3.0, 0);
        assert_eq!(port.channels(), 0);
        assert_eq!(port.voltage(0), 0.0);
        assert_eq!(port.polyphony(), None);
    }

    #[test]
    fn test_channel_count_is_clamped() {
        let mut port = PolyPort::new();
        port.connect(99);
        assert_eq!(port.channels(), MAX_POLY);
        assert_eq!(port.polyphony(), Some(MAX_POLY));
        port.set_voltage(1.0, 40); // ignored
    }

    #[test]
    fn test_shrinking_clears_dropped_channels() {
        let mut port = PolyPort::new();
        port.connect(4);
        port.set_voltage(2.0, 3);
        port.set_channels(2);
        port.set_channels(4);
        assert_eq!(port.voltage(3), 0.0);
    }
}
