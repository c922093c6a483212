/// Fixed ordered palette of chat color tags. The front end maps these onto
/// its stylesheet; the order is part of the wire contract.
pub const COLOR_PALETTE: [&str; 5] = [
    "text-primary",
    "text-success",
    "text-danger",
    "text-warning",
    "text-info",
];

/// Deterministic cosmetic tag for a chat sender.
///
/// The same id must yield the same tag whether the message is rendered from
/// the read path or delivered over a live broadcast, so every caller goes
/// through this one function.
#[must_use]
pub fn color_class(user_id: i64) -> &'static str {
    let idx = user_id.rem_euclid(COLOR_PALETTE.len() as i64) as usize;
    COLOR_PALETTE[idx]
}
