//! Page layout calculations
//!
//! Everything generated by the converters lands on a US Letter page. Values
//! are in PDF points (1/72 inch) with the origin at the bottom-left corner.

/// Simple length type in points
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Length(pub f32);

impl Length {
    /// Create a length from points
    pub fn from_pt(pt: f32) -> Self {
        Length(pt)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f32) -> Self {
        Length(inches * 72.0)
    }

    /// Get the value in points
    pub fn pt(&self) -> f32 {
        self.0
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_pt(612.0),
            height: Length::from_pt(792.0),
        }
    }

    /// MediaBox array for this page size
    pub fn media_box(&self) -> [f32; 4] {
        [0.0, 0.0, self.width.pt(), self.height.pt()]
    }

    /// Scale and center a `width` × `height` box on the page, preserving
    /// aspect ratio. Returns `None` for a degenerate box.
    pub fn fit_centered(&self, width: f32, height: f32) -> Option<Placement> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let scale = (self.width.pt() / width).min(self.height.pt() / height);
        let placed_width = width * scale;
        let placed_height = height * scale;

        Some(Placement {
            x: (self.width.pt() - placed_width) / 2.0,
            y: (self.height.pt() - placed_height) / 2.0,
            width: placed_width,
            height: placed_height,
        })
    }
}

/// Where a scaled box sits on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Line layout used for plain-text pages
#[derive(Debug, Clone, Copy)]
pub struct TextLayout {
    pub font_size: f32,
    pub left: Length,
    /// Baseline of the first line on each page
    pub top: Length,
    /// A new page starts once the baseline would fall below this
    pub bottom: Length,
    pub line_height: Length,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            left: Length::from_pt(50.0),
            top: Length::from_pt(750.0),
            bottom: Length::from_pt(50.0),
            line_height: Length::from_pt(15.0),
        }
    }
}

impl TextLayout {
    /// Split `line_count` lines into per-page chunks.
    ///
    /// Returns the number of lines on each page. Always yields at least one
    /// page so an empty text file still produces a (blank) PDF.
    pub fn paginate(&self, line_count: usize) -> Vec<usize> {
        let per_page = self.lines_per_page();
        if line_count == 0 {
            return vec![0];
        }

        let mut pages = Vec::new();
        let mut remaining = line_count;
        while remaining > 0 {
            let take = remaining.min(per_page);
            pages.push(take);
            remaining -= take;
        }
        pages
    }

    /// Number of baselines from `top` down to and including `bottom`
    pub fn lines_per_page(&self) -> usize {
        let span = self.top.pt() - self.bottom.pt();
        ((span / self.line_height.pt()).floor() as usize + 1).max(1)
    }
}
