//! Export statistics written to the archive top.

/// Counts gathered during setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobStatistics {
    pub trans_static_num: u32,
    pub trans_anim_num: u32,
    pub trans_col_num: u32,
}

impl JobStatistics {
    /// `"Name value "` pairs for every non-zero counter.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        for (name, value) in [
            ("TransStaticNum", self.trans_static_num),
            ("TransAnimNum", self.trans_anim_num),
            ("TransColNum", self.trans_col_num),
        ] {
            if value > 0 {
                s.push_str(&format!("{} {} ", name, value));
            }
        }
        s
    }
}
