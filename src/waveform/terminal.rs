// src/waveform/terminal.rs

use super::Columns;

/// Draws columns as text rows, `+1.0` on the top row and `-1.0` on the bottom.
/// Values outside `[-1, 1]` are clamped; NaN columns stay blank.
pub fn render_ascii(columns: &Columns, height: usize) -> Vec<String> {
    let h = height.max(4);
    let mut lines = vec![vec![' '; columns.len()]; h];
    // amplitude to row index: +1.0 is row 0, -1.0 is row h - 1
    let to_row = |v: f32| -> usize {
        let clamped = v.clamp(-1.0, 1.0);
        let y = (0.5 - 0.5 * clamped) * (h as f32 - 1.0);
        y.round() as usize
    };
    for (x, (&lo, &hi)) in columns.min.iter().zip(&columns.max).enumerate() {
        if lo.is_nan() || hi.is_nan() {
            continue;
        }
        let top = to_row(hi);
        let bottom = to_row(lo);
        let (a, b) = if top <= bottom { (top, bottom) } else { (bottom, top) };
        for row in &mut lines[a..=b] {
            row[x] = '█';
        }
    }
    lines.into_iter().map(|row| row.into_iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_column_fills_every_row() {
        let cols = Columns {
            min: vec![-1.0, 0.0],
            max: vec![1.0, 0.0],
        };
        let rows = render_ascii(&cols, 5);
        assert_eq!(rows.len(), 5);
        for row in &rows {
            assert_eq!(row.chars().next(), Some('█'));
        }
        // 0.0 sits on the middle row only
        let second: Vec<char> = rows.iter().map(|r| r.chars().nth(1).unwrap()).collect();
        assert_eq!(second, vec![' ', ' ', '█', ' ', ' ']);
    }

    #[test]
    fn height_has_a_floor() {
        let rows = render_ascii(&Columns::default(), 1);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.is_empty()));
    }
}
