/// Equal-width histogram over the finite values of a score series.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin the finite values. `NaN` sentinels are skipped. Returns `None` when
    /// nothing finite is left or `bins` is zero.
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return None;
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;

        let mut counts = vec![0usize; bins];
        for v in finite {
            let bin = if width > 0.0 {
                // The top edge belongs to the last bin.
                (((v - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }

        Some(Self { min, max, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Text rendering: one line per bin, bars scaled to `bar_width` characters.
    pub fn render(&self, bar_width: usize) -> String {
        let bins = self.counts.len();
        let width = (self.max - self.min) / bins as f64;
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);

        let mut out = String::new();
        for (i, &count) in self.counts.iter().enumerate() {
            let lo = self.min + width * i as f64;
            let bar = "#".repeat(count * bar_width / peak);
            out.push_str(&format!("{:>9.4} | {:<w$} {}\n", lo, bar, count, w = bar_width));
        }
        out
    }
}
