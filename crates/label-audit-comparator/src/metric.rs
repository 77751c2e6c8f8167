use label_audit_types::{AuditError, AuditResult, BBox};

/// Relative difference of two values against their mean:
/// `|a - b| / ((a + b) / 2)`. Symmetric in its arguments.
pub fn percentage_diff(a: f64, b: f64) -> AuditResult<f64> {
    let mean = (a + b) / 2.0;
    if mean == 0.0 {
        return Err(AuditError::degenerate(a, b));
    }
    Ok(((a - b) / mean).abs())
}

/// Center displacement measured in units of the reference box extent.
pub fn offset_ratio(reference: f64, candidate: f64, extent: f64) -> AuditResult<f64> {
    if extent == 0.0 {
        return Err(AuditError::degenerate(reference, candidate));
    }
    Ok((reference - candidate).abs() / extent)
}

/// Every quantity the classifier compares for one `(before, after)` pair.
///
/// Size checks use [`percentage_diff`]. Positional checks come in two forms:
/// the symmetric metric on the centers (used by the unchanged rule) and the
/// displacement normalized by the before box's other-axis extent (used by the
/// changed and deleted rules): `|dy| / height` and `|dx| / width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDelta {
    pub width: f64,
    pub height: f64,
    pub x_center: f64,
    pub y_center: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl BoxDelta {
    pub fn between(before: &BBox, after: &BBox) -> AuditResult<Self> {
        Ok(Self {
            width: percentage_diff(before.width, after.width)?,
            height: percentage_diff(before.height, after.height)?,
            x_center: percentage_diff(before.x_center, after.x_center)?,
            y_center: percentage_diff(before.y_center, after.y_center)?,
            x_offset: offset_ratio(before.x_center, after.x_center, before.width)?,
            y_offset: offset_ratio(before.y_center, after.y_center, before.height)?,
        })
    }

    /// Quantities driving the unchanged rule.
    pub fn similarity_terms(&self) -> [f64; 4] {
        [self.width, self.height, self.x_center, self.y_center]
    }

    /// Quantities driving the changed and deleted rules.
    pub fn displacement_terms(&self) -> [f64; 4] {
        [self.width, self.height, self.y_offset, self.x_offset]
    }
}
