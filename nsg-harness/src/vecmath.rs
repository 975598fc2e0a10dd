#[inline(always)]
pub fn dot_product(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len());
    left.iter().zip(right).map(|(l, r)| l * r).sum()
}

#[inline(always)]
pub fn squared_euclidean(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len());
    left.iter()
        .zip(right)
        .map(|(l, r)| {
            let d = l - r;
            d * d
        })
        .sum()
}

#[inline(always)]
pub fn squared_norm(vector: &[f32]) -> f32 {
    dot_product(vector, vector)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn euclidean_matches_expanded_form() {
        let a = [0.5, -1.0, 2.0, 0.25];
        let b = [1.5, 1.0, -2.0, 0.0];
        let expanded = squared_norm(&a) + squared_norm(&b) - 2.0 * dot_product(&a, &b);
        assert_relative_eq!(squared_euclidean(&a, &b), expanded, epsilon = 1e-5);
        assert_relative_eq!(squared_euclidean(&a, &b), 21.0625);
    }
}
