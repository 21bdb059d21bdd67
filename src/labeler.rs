use crate::state::{Prediction, PredictionResult};

/// Display label for a predicted outcome. Unknown results read as a draw.
pub fn label(result: Option<PredictionResult>, home_name: &str, away_name: &str) -> String {
    match result {
        Some(PredictionResult::HomeWin) => format!("{home_name} to win"),
        Some(PredictionResult::AwayWin) => format!("{away_name} to win"),
        Some(PredictionResult::Draw) | None => "Draw".to_string(),
    }
}

/// One-decimal percentage of the predicted outcome, `None` when there is
/// nothing to show.
pub fn confidence_percent(prediction: &Prediction) -> Option<String> {
    let result = prediction.result?;
    let confidence = prediction.confidence.as_ref()?;
    let p = confidence[result.index()];
    if !p.is_finite() {
        return None;
    }
    Some(format!("{:.1}%", p * 100.0))
}
