// fonts.rs — pick a font that can draw hotspot labels in any script

use std::path::{Path, PathBuf};

/// Broad-coverage fonts commonly present per platform. Hotspot labels are
/// user data, so Latin-only defaults are not enough.
fn system_candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let dir = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["arialuni.ttf", "msyh.ttf", "malgun.ttf", "segoeui.ttf", "arial.ttf"] {
            out.push(dir.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for f in [
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
            "/Library/Fonts/NotoSansCJK-Regular.ttc",
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
        ] {
            out.push(PathBuf::from(f));
        }
    } else if cfg!(unix) {
        for f in [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        ] {
            out.push(PathBuf::from(f));
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            out.push(dir.join("assets").join("label_font.ttf"));
        }
    }
    out.push(PathBuf::from("assets").join("label_font.ttf"));
    out
}

/// Reads a font file and keeps it only if `ab_glyph` can parse it.
/// Some `.ttc` collections fail here and are skipped.
fn load_font(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    match ab_glyph::FontRef::try_from_slice(&bytes) {
        Ok(_) => Some(bytes),
        Err(_) => {
            log::debug!("font {} not usable", path.display());
            None
        }
    }
}

pub fn find_label_font(preferred: Option<&Path>) -> Option<(PathBuf, Vec<u8>)> {
    preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(system_candidates())
        .find_map(|p| load_font(&p).map(|bytes| (p, bytes)))
}

/// Puts the label font in front of egui's defaults. Without one, egui's
/// built-in fonts are used and unsupported glyphs render as boxes.
pub fn install_label_font(ctx: &egui::Context, preferred: Option<&Path>) {
    let Some((path, bytes)) = find_label_font(preferred) else {
        log::warn!("no wide-coverage font found, labels use egui defaults");
        return;
    };
    log::info!("label font: {}", path.display());

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("label".to_owned(), egui::FontData::from_owned(bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.insert(0, "label".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn garbage_font_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"definitely not a font").expect("write");
        assert!(load_font(file.path()).is_none());
        assert!(load_font(Path::new("/no/such/font.ttf")).is_none());
    }
}
