/// Lag-1 differencing applied `order` times.
///
/// Each pass shortens the sequence by one; once fewer than two values remain
/// the result is empty. `order == 0` returns the series unchanged.
pub fn difference(series: &[f64], order: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..order {
        if result.is_empty() {
            break;
        }
        result = difference_once(&result);
    }
    result
}

fn difference_once(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}
