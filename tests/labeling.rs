use chrono::{TimeZone, Utc};

use fixture_predictor::display::{
    FixtureCard, FixturePanel, fixture_panel_message, matchday_message, score_text,
    unplayed_score_text,
};
use fixture_predictor::labeler::{confidence_percent, label};
use fixture_predictor::state::{
    Fixture, LoadState, MatchdaySnapshotData, Prediction, PredictionResult, ScoreLine,
};

#[test]
fn label_table() {
    assert_eq!(
        label(Some(PredictionResult::HomeWin), "Barcelona", "Getafe"),
        "Barcelona to win"
    );
    assert_eq!(
        label(Some(PredictionResult::AwayWin), "Barcelona", "Getafe"),
        "Getafe to win"
    );
    assert_eq!(
        label(Some(PredictionResult::Draw), "Barcelona", "Getafe"),
        "Draw"
    );
    assert_eq!(label(None, "Barcelona", "Getafe"), "Draw");
    assert_eq!(label(Some(PredictionResult::HomeWin), "", ""), " to win");
}

#[test]
fn confidence_uses_result_index() {
    let p = Prediction {
        result: Some(PredictionResult::HomeWin),
        confidence: Some([0.823, 0.1, 0.077]),
    };
    assert_eq!(confidence_percent(&p).as_deref(), Some("82.3%"));

    let away = Prediction {
        result: Some(PredictionResult::AwayWin),
        confidence: Some([0.1, 0.15, 0.75]),
    };
    assert_eq!(confidence_percent(&away).as_deref(), Some("75.0%"));
}

#[test]
fn missing_confidence_yields_nothing() {
    let p = Prediction {
        result: Some(PredictionResult::Draw),
        confidence: None,
    };
    assert_eq!(confidence_percent(&p), None);

    let no_result = Prediction {
        result: None,
        confidence: Some([0.3, 0.4, 0.3]),
    };
    assert_eq!(confidence_percent(&no_result), None);
}

#[test]
fn cards_use_placeholders_only_at_render_time() {
    let fixture = Fixture {
        id: None,
        utc_date: Some(Utc.with_ymd_and_hms(2025, 8, 17, 19, 30, 0).unwrap()),
        home_name: "Barcelona".to_string(),
        away_name: "Valencia".to_string(),
        score: None,
        prediction: Some(Prediction {
            result: Some(PredictionResult::HomeWin),
            confidence: None,
        }),
    };
    let card = FixtureCard::from_fixture(&fixture);
    assert_eq!(card.prediction, "Barcelona to win");
    assert_eq!(card.confidence, None);
    assert_eq!(card.score, None);
    assert_eq!(card.date, "2025-08-17");

    assert_eq!(unplayed_score_text(), "- – -");
    assert_eq!(
        score_text(ScoreLine {
            home: Some(2),
            away: None
        }),
        "2 – -"
    );
}

#[test]
fn fixture_without_prediction_reads_as_draw() {
    let fixture = Fixture {
        id: None,
        utc_date: None,
        home_name: "A".to_string(),
        away_name: "B".to_string(),
        score: Some(ScoreLine {
            home: Some(1),
            away: Some(1),
        }),
        prediction: None,
    };
    let card = FixtureCard::from_fixture(&fixture);
    assert_eq!(card.prediction, "Draw");
    assert_eq!(card.score.as_deref(), Some("1 – 1"));
    assert_eq!(card.date, "TBD");
}

#[test]
fn panel_messages_separate_loading_failed_and_empty() {
    let next = FixturePanel::Next;
    assert_eq!(
        fixture_panel_message(next, false, LoadState::Idle, true),
        Some("Select a team to view upcoming fixtures.")
    );
    assert_eq!(
        fixture_panel_message(next, true, LoadState::Loading, true),
        Some("Loading...")
    );
    assert_eq!(
        fixture_panel_message(next, true, LoadState::Ready, true),
        Some("No upcoming matches scheduled.")
    );
    assert_eq!(fixture_panel_message(next, true, LoadState::Ready, false), None);
    assert_ne!(
        fixture_panel_message(next, true, LoadState::Unavailable, true),
        fixture_panel_message(next, true, LoadState::Ready, true)
    );

    let failed = MatchdaySnapshotData::unavailable();
    let empty = MatchdaySnapshotData {
        matchday_number: Some(38),
        fixtures: Vec::new(),
    };
    let failed_msg = matchday_message(LoadState::Unavailable, &failed);
    let empty_msg = matchday_message(LoadState::Ready, &empty);
    assert_eq!(failed_msg, Some("Matchday data unavailable."));
    assert!(empty_msg.is_some());
    assert_ne!(failed_msg, empty_msg);
}
