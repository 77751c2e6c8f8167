use label_audit_types::{BonusWindow, RateTable};

/// Rates resolved for one frame position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRates {
    pub increased: bool,
    pub diff_box: f64,
    pub new_box: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSchedule {
    table: RateTable,
    bonus: BonusWindow,
}

impl RateSchedule {
    pub fn new(table: RateTable, bonus: BonusWindow) -> Self {
        Self { table, bonus }
    }

    /// `position` is the zero-based index inside the selected frame window,
    /// not a number derived from the file name.
    pub fn is_increased(&self, position: usize) -> bool {
        self.bonus.contains(position)
    }

    pub fn for_position(&self, position: usize) -> FrameRates {
        let increased = self.is_increased(position);
        if increased {
            FrameRates {
                increased,
                diff_box: self.table.cost_diff_box_increased,
                new_box: self.table.cost_new_box_increased,
            }
        } else {
            FrameRates {
                increased,
                diff_box: self.table.cost_diff_box,
                new_box: self.table.cost_new_box,
            }
        }
    }
}
