// hotspot.rs — color key -> label registry

use std::collections::HashMap;

/// An RGB triplet read from the mask image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pure black marks "no hotspot" in the mask.
    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }

    /// The registry key: decimal channels joined by commas, e.g. `"255,0,0"`.
    pub fn key(&self) -> String {
        format!("{},{},{}", self.r, self.g, self.b)
    }
}

/// Parses a `"R,G,B"` key. Whitespace is not accepted, matching the exact
/// string lookup done by [`HotspotRegistry::label_for`].
pub fn parse_color_key(key: &str) -> Option<Rgb> {
    let mut parts = key.split(',');
    let r = parts.next()?.parse::<u8>().ok()?;
    let g = parts.next()?.parse::<u8>().ok()?;
    let b = parts.next()?.parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb { r, g, b })
}

/// Static mapping from mask color to hotspot label.
///
/// Lookup is exact: a mask saved with lossy compression can shift a channel by
/// one and the region then silently stops resolving. Masks should be stored
/// losslessly (PNG/BMP).
#[derive(Debug, Clone, Default)]
pub struct HotspotRegistry {
    labels: HashMap<String, String>,
}

impl HotspotRegistry {
    pub fn new(labels: HashMap<String, String>) -> Self {
        for key in labels.keys() {
            if parse_color_key(key).is_none() {
                log::warn!("hotspot key {:?} is not an \"R,G,B\" triplet and will never match", key);
            }
        }
        Self { labels }
    }

    pub fn label_for(&self, color: Rgb) -> Option<&str> {
        self.labels.get(&color.key()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HotspotRegistry {
        let mut labels = HashMap::new();
        labels.insert("255,0,0".to_string(), "Outlet 1".to_string());
        labels.insert("245,0,0".to_string(), "Window 1".to_string());
        HotspotRegistry::new(labels)
    }

    #[test]
    fn exact_key_resolves() {
        let reg = registry();
        assert_eq!(reg.label_for(Rgb::new(255, 0, 0)), Some("Outlet 1"));
        assert_eq!(reg.label_for(Rgb::new(245, 0, 0)), Some("Window 1"));
    }

    #[test]
    fn off_by_one_channel_does_not_match() {
        let reg = registry();
        assert_eq!(reg.label_for(Rgb::new(254, 0, 0)), None);
        assert_eq!(reg.label_for(Rgb::new(255, 1, 0)), None);
        assert_eq!(reg.label_for(Rgb::new(255, 0, 1)), None);
    }

    #[test]
    fn color_key_format() {
        assert_eq!(Rgb::new(1, 22, 255).key(), "1,22,255");
        assert_eq!(parse_color_key("1,22,255"), Some(Rgb::new(1, 22, 255)));
        assert_eq!(parse_color_key("1, 22, 255"), None);
        assert_eq!(parse_color_key("256,0,0"), None);
        assert_eq!(parse_color_key("1,2"), None);
        assert_eq!(parse_color_key("1,2,3,4"), None);
    }

    #[test]
    fn black_is_no_hotspot() {
        assert!(Rgb::BLACK.is_black());
        assert!(!Rgb::new(0, 0, 1).is_black());
    }
}
