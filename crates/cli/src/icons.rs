//! Icon sets for the dashboard

/// Glyphs used in rows, headers and the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icons {
    pub app: &'static str,
    pub folder: &'static str,
    pub file: &'static str,
    pub create: &'static str,
    pub write: &'static str,
    pub remove: &'static str,
    pub rename: &'static str,
    pub chmod: &'static str,
    pub atomic: &'static str,
    pub total: &'static str,
}

impl Icons {
    /// Patched-font glyphs (Nerd Fonts)
    pub const NERD: Icons = Icons {
        app: "\u{f06e}",
        folder: "\u{f07b}",
        file: "\u{f15b}",
        create: "\u{f067}",
        write: "\u{f040}",
        remove: "\u{f1f8}",
        rename: "\u{f074}",
        chmod: "\u{f023}",
        atomic: "\u{f0e7}",
        total: "\u{f080}",
    };

    /// Plain ASCII fallback
    pub const ASCII: Icons = Icons {
        app: "*",
        folder: "[D]",
        file: "[F]",
        create: "C",
        write: "W",
        remove: "R",
        rename: "M",
        chmod: "P",
        atomic: "A",
        total: "E",
    };

    pub fn select(nerd_fonts: bool) -> Icons {
        if nerd_fonts {
            Self::NERD
        } else {
            Self::ASCII
        }
    }

    /// Column headers in counter order: create, write, remove, rename, chmod
    pub fn columns(&self) -> [&'static str; 5] {
        [self.create, self.write, self.remove, self.rename, self.chmod]
    }
}
