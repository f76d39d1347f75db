use std::fmt;

/// Characters on each side of the axis for the longest bar.
const HALF_WIDTH: usize = 20;

/// A horizontal diverging bar chart of word weights.
///
/// Rows are drawn in the order given, so the most important word goes first.
/// Positive weights grow right of the axis, negative weights left of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub rows: Vec<(String, f64)>,
}

impl Figure {
    pub fn new(title: impl Into<String>, rows: Vec<(String, f64)>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    fn bar(weight: f64, max_abs: f64) -> String {
        let length = if max_abs > 0.0 {
            ((weight.abs() / max_abs) * HALF_WIDTH as f64).round() as usize
        } else {
            0
        };
        let length = length.clamp(usize::from(weight != 0.0), HALF_WIDTH);
        let filled = "█".repeat(length);
        if weight < 0.0 {
            format!("{}{}|{}", " ".repeat(HALF_WIDTH - length), filled, " ".repeat(HALF_WIDTH))
        } else {
            format!("{}|{}{}", " ".repeat(HALF_WIDTH), filled, " ".repeat(HALF_WIDTH - length))
        }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if self.rows.is_empty() {
            return writeln!(f, "  (no words to explain)");
        }

        let label_width = self.rows.iter().map(|(word, _)| word.chars().count()).max().unwrap_or(0);
        let max_abs = self.rows.iter().fold(0.0f64, |m, (_, w)| m.max(w.abs()));
        for (word, weight) in &self.rows {
            writeln!(
                f,
                "  {:>width$} {} {:+.4}",
                word,
                Self::bar(*weight, max_abs),
                weight,
                width = label_width
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_diverging_bars() {
        let figure = Figure::new(
            "Local explanation for class Normal",
            vec![("love".to_string(), 0.4), ("hate".to_string(), -0.2)],
        );
        let rendered = figure.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Local explanation for class Normal");
        assert!(lines[1].contains("love") && lines[1].ends_with("+0.4000"));
        assert!(lines[2].contains("hate") && lines[2].ends_with("-0.2000"));

        let love_bar = lines[1].split('|').nth(1).unwrap();
        assert_eq!(love_bar.matches('█').count(), HALF_WIDTH);
        let hate_bar = lines[2].split('|').next().unwrap();
        assert_eq!(hate_bar.matches('█').count(), HALF_WIDTH / 2);
    }

    #[test]
    fn test_render_empty() {
        let figure = Figure::new("Local explanation for class Hateful", vec![]);
        assert!(figure.to_string().contains("no words"));
    }
}
