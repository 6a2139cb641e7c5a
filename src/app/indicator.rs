//! "Waiting WiFi" animation shown while the network link is down.

const LABEL: &str = "Waiting WiFi";
const MAX_DOTS: usize = 3;

/// Frame counter for the wait animation.  Survives across loop passes;
/// reset once the link comes back.
#[derive(Debug, Default)]
pub struct WaitIndicator {
    dots: usize,
}

impl WaitIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the current frame and step to the next one.
    pub fn advance(&mut self) -> String {
        let frame = format!("{LABEL}{}", ".".repeat(self.dots));
        self.dots = (self.dots + 1) % (MAX_DOTS + 1);
        frame
    }

    pub fn reset(&mut self) {
        self.dots = 0;
    }
}
