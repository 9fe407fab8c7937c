// ============================================================
// Layer 4 — Hold-out Splitter
// ============================================================
// Shuffles normalized rows and peels a validation hold-out off
// the end. Hold-out rows never receive gradient updates; they
// only feed the per-epoch validation loss.
//
// On tiny corpora the hold-out shrinks first: at least one row
// always stays on the training side.

use rand::{seq::SliceRandom, Rng};

/// Shuffle `rows` with `rng`, then split into (training, hold-out).
///
/// `validation_fraction` of the rows (rounded) go to the hold-out.
/// The training side is non-empty whenever `rows` is.
pub fn split_holdout<T, R>(mut rows: Vec<T>, validation_fraction: f64, rng: &mut R) -> (Vec<T>, Vec<T>)
where
    R: Rng + ?Sized,
{
    rows.shuffle(rng);

    let total   = rows.len();
    let holdout = ((total as f64) * validation_fraction).round() as usize;
    let keep    = total.saturating_sub(holdout).max(total.min(1));

    let holdout_rows = rows.split_off(keep);
    tracing::debug!("Split {} rows: {} train, {} hold-out", total, rows.len(), holdout_rows.len());

    (rows, holdout_rows)
}
