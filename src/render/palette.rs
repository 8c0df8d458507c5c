//! Panel colors.
//!
//! LED matrices have no background to adapt to, so there is a single
//! palette; brightness and staleness dimming are applied per pixel.

use crate::status::ServiceLevel;

/// One LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel to `percent` of its value, capped at 100.
    pub fn scale(self, percent: u8) -> Self {
        let percent = u16::from(percent.min(100));
        let channel = |c: u8| (u16::from(c) * percent / 100) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }

    pub fn is_lit(self) -> bool {
        self != Self::BLACK
    }
}

/// Share of full intensity kept when the panel shows stale or offline data.
pub const DIM_PERCENT: u8 = 40;

/// Color assignments for the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Lines on regular service.
    pub normal: Rgb,
    /// Lines on the weekend or holiday schedule.
    pub reduced: Rgb,
    /// Lines under an alert, and error messages.
    pub alert: Rgb,
    /// Station name and period label.
    pub text: Rgb,
    /// Error details and the staleness marker.
    pub amber: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

impl Palette {
    pub fn standard() -> Self {
        Self {
            normal: Rgb::new(0, 255, 0),
            reduced: Rgb::new(255, 255, 0),
            alert: Rgb::new(255, 0, 0),
            text: Rgb::new(255, 255, 255),
            amber: Rgb::new(255, 191, 0),
        }
    }

    /// Get the color for a line's service level
    pub fn level_color(&self, level: ServiceLevel) -> Rgb {
        match level {
            ServiceLevel::Normal => self.normal,
            ServiceLevel::Reduced => self.reduced,
            ServiceLevel::Alert => self.alert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        let amber = Palette::standard().amber;
        assert_eq!(amber.scale(100), amber);
        assert_eq!(amber.scale(0), Rgb::BLACK);
        assert_eq!(amber.scale(50), Rgb::new(127, 95, 0));
        assert_eq!(amber.scale(250), amber);
    }

    #[test]
    fn test_level_colors_are_distinct() {
        let palette = Palette::standard();
        let normal = palette.level_color(ServiceLevel::Normal);
        let reduced = palette.level_color(ServiceLevel::Reduced);
        let alert = palette.level_color(ServiceLevel::Alert);
        assert_ne!(normal, reduced);
        assert_ne!(reduced, alert);
        assert_ne!(normal, alert);
    }
}
