use crate::schema::counters::{Aggregation64, AggregationDouble};

/// Score reported when a capacity score could not be measured: a score of
/// -100 scaled by 100, stored in an unsigned slot.
pub const INVALID_SCORE: u32 = (-100i32 * 100) as u32;

impl Aggregation64 {
    /// Aggregation seeded with a single sample.
    pub fn from_value(value: u64) -> Self {
        Self {
            sum: value,
            min: value,
            max: value,
            weight: 1,
        }
    }

    /// Folds one raw sample. The first sample seeds min and max.
    pub fn record(&mut self, value: u64) {
        if self.weight == 0 {
            *self = Self::from_value(value);
            return;
        }
        self.sum = self.sum.saturating_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.weight += 1;
    }
}

impl AggregationDouble {
    pub fn from_value(value: f64) -> Self {
        Self {
            sum: value,
            min: value,
            max: value,
            weight: 1,
        }
    }

    pub fn record(&mut self, value: f64) {
        if self.weight == 0 {
            *self = Self::from_value(value);
            return;
        }
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.weight += 1;
    }
}

/// Folds an optional counter or gauge sample. Unset samples are skipped.
pub fn fold_counter(out: &mut Option<Aggregation64>, value: Option<u64>) {
    if let Some(value) = value {
        out.get_or_insert_with(Aggregation64::default).record(value);
    }
}

/// Folds a score sample, dropping [`INVALID_SCORE`] entirely.
pub fn fold_score(out: &mut Option<Aggregation64>, value: Option<u32>) {
    match value {
        Some(INVALID_SCORE) | None => {}
        Some(score) => fold_counter(out, Some(u64::from(score))),
    }
}

/// Folds an optional floating-point sample. NaN is not a sample.
pub fn fold_double(out: &mut Option<AggregationDouble>, value: Option<f64>) {
    if let Some(value) = value.filter(|v| !v.is_nan()) {
        out.get_or_insert_with(AggregationDouble::default).record(value);
    }
}

/// Takes the input value unless it is the type's default (unset).
pub fn replace_value<T: Default + PartialEq>(out: &mut T, input: T) {
    if input != T::default() {
        *out = input;
    }
}

/// Takes the input value when it is set.
pub fn replace_opt<T>(out: &mut Option<T>, input: Option<T>) {
    if input.is_some() {
        *out = input;
    }
}

/// Flag fields accumulate every bit ever seen.
pub fn bit_or(out: &mut u32, input: u32) {
    *out |= input;
}

/// Folds a positional list index by index, growing `out` when the input is
/// longer.
pub fn fold_list(out: &mut Vec<Aggregation64>, values: Vec<u64>) {
    if out.len() < values.len() {
        out.resize(values.len(), Aggregation64::default());
    }
    for (slot, value) in out.iter_mut().zip(values) {
        slot.record(value);
    }
}

/// Appends input elements not already present, keeping first-seen order.
pub fn union<T: PartialEq>(out: &mut Vec<T>, input: Vec<T>) {
    for item in input {
        if !out.contains(&item) {
            out.push(item);
        }
    }
}

/// Replaces the whole list when the input carries one.
pub fn replace_list_if_nonempty<T>(out: &mut Vec<T>, input: Vec<T>) {
    if !input.is_empty() {
        *out = input;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_score_constant() {
        assert_eq!(INVALID_SCORE, 4_294_957_296);
        assert_eq!(INVALID_SCORE as i32, -10_000);
    }

    #[test]
    fn test_counter_accumulation() {
        let mut out = None;
        fold_counter(&mut out, Some(4));
        fold_counter(&mut out, Some(100));

        let agg = out.expect("aggregation should be seeded");
        assert_eq!(agg.sum, 104);
        assert_eq!(agg.min, 4);
        assert_eq!(agg.max, 100);
        assert_eq!(agg.weight, 2);
    }

    #[test]
    fn test_first_sample_seeds_min() {
        let mut agg = Aggregation64::default();
        agg.record(50);
        assert_eq!(agg.min, 50, "min must not stay at the zero default");
        agg.record(70);
        assert_eq!(agg.min, 50);
        assert_eq!(agg.max, 70);
    }

    #[test]
    fn test_unset_counter_is_skipped() {
        let mut out = Some(Aggregation64::from_value(9));
        fold_counter(&mut out, None);
        assert_eq!(out, Some(Aggregation64::from_value(9)));

        let mut empty = None;
        fold_counter(&mut empty, None);
        assert!(empty.is_none());
    }

    #[test]
    fn test_counter_sum_saturates() {
        let mut agg = Aggregation64::from_value(u64::MAX - 1);
        agg.record(10);
        assert_eq!(agg.sum, u64::MAX);
        assert_eq!(agg.weight, 2);
    }

    #[test]
    fn test_invalid_score_excluded() {
        let mut out = None;
        fold_score(&mut out, Some(7000));
        let before = out;

        fold_score(&mut out, Some(INVALID_SCORE));
        assert_eq!(out, before);

        let mut fresh = None;
        fold_score(&mut fresh, Some(INVALID_SCORE));
        assert!(fresh.is_none());
    }

    #[test]
    fn test_fold_double() {
        let mut out = None;
        fold_double(&mut out, Some(1.5));
        fold_double(&mut out, Some(f64::NAN));
        fold_double(&mut out, Some(-0.5));

        let agg = out.expect("aggregation should be seeded");
        assert_eq!(agg.sum, 1.0);
        assert_eq!(agg.min, -0.5);
        assert_eq!(agg.max, 1.5);
        assert_eq!(agg.weight, 2);
    }

    #[test]
    fn test_replace_value_ignores_default() {
        let mut name = String::from("nginx");
        replace_value(&mut name, String::new());
        assert_eq!(name, "nginx");
        replace_value(&mut name, "envoy".to_string());
        assert_eq!(name, "envoy");

        let mut port = 80u32;
        replace_value(&mut port, 0);
        assert_eq!(port, 80);
    }

    #[test]
    fn test_replace_opt() {
        let mut status = Some(1u32);
        replace_opt(&mut status, None);
        assert_eq!(status, Some(1));
        replace_opt(&mut status, Some(0));
        assert_eq!(status, Some(0));
    }

    #[test]
    fn test_bit_or() {
        let mut role = 0b01;
        bit_or(&mut role, 0b10);
        assert_eq!(role, 0b11);
        bit_or(&mut role, 0);
        assert_eq!(role, 0b11);
    }

    #[test]
    fn test_fold_list_extends() {
        let mut out = Vec::new();
        fold_list(&mut out, vec![10, 20]);
        fold_list(&mut out, vec![30, 40, 50]);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].sum, 40);
        assert_eq!(out[0].weight, 2);
        assert_eq!(out[1].max, 40);
        assert_eq!(out[2], Aggregation64::from_value(50));
    }

    #[test]
    fn test_fold_list_shorter_input() {
        let mut out = Vec::new();
        fold_list(&mut out, vec![1, 2, 3]);
        fold_list(&mut out, vec![5]);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].weight, 2);
        assert_eq!(out[2].weight, 1);
    }

    #[test]
    fn test_union_keeps_order() {
        let mut out = vec![3, 1];
        union(&mut out, vec![1, 2, 3, 4]);
        assert_eq!(out, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_replace_list_if_nonempty() {
        let mut out = vec![50, 95];
        replace_list_if_nonempty(&mut out, Vec::new());
        assert_eq!(out, vec![50, 95]);
        replace_list_if_nonempty(&mut out, vec![99]);
        assert_eq!(out, vec![99]);
    }
}
