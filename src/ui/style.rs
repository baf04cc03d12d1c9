/// Compile-time chrome tokens for the pinned panel and its drag handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeTokens {
    pub panel_background: &'static str,
    pub panel_border: &'static str,
    pub panel_shadow: &'static str,
    pub panel_radius: &'static str,
    pub panel_padding: &'static str,
    /// Leaves room for the drag handle on the leading edge.
    pub panel_padding_leading: &'static str,
    pub handle_id: &'static str,
    pub handle_width: &'static str,
    pub handle_background: &'static str,
    pub handle_border: &'static str,
    pub handle_z_index: u32,
    pub popup_z_index: u32,
    pub popup_max_height: &'static str,
}

pub const PANEL_CHROME: ChromeTokens = ChromeTokens {
    panel_background: "#ffffff",
    panel_border: "1px solid #e1e1e1",
    panel_shadow: "-2px 0 8px rgba(0, 0, 0, 0.1)",
    panel_radius: "0",
    panel_padding: "16px",
    panel_padding_leading: "21px",
    handle_id: "formulaBarResizeHandle",
    handle_width: "5px",
    handle_background: "#e1e1e1",
    handle_border: "1px solid #d1d1d1",
    handle_z_index: 10_001,
    popup_z_index: 10_002,
    popup_max_height: "300px",
};
