use gridzero_core::{ConnectK, GameRules, Pentago, Player};
use gridzero_mcts::{MctsConfig, UctPolicy, UniformEvaluator, UniformPolicy};
use gridzero_selfplay::{
    load_artifact, play_game, run_iteration, save_artifact, ArtifactPaths, GameResult,
    SelfPlayConfig,
};

#[test]
fn search_self_play_labels_follow_the_mover() {
    let game = ConnectK::connect_four();
    let policy = UctPolicy::new(UniformEvaluator, MctsConfig::default().with_iterations(20));
    let record = play_game(&game, [&policy, &policy], &SelfPlayConfig::default()).unwrap();

    assert_eq!(record.states.len(), record.distributions.len());
    assert_eq!(record.states.len(), record.outcomes.len());

    let reward = record.result.reward();
    for (state, &outcome) in record.states.iter().zip(&record.outcomes) {
        let expected = match state.player() {
            Player::Zero => reward,
            Player::One => -reward,
        };
        assert_eq!(outcome, expected);
    }

    // Every recorded distribution is a distribution over legal actions
    for (state, dist) in record.states.iter().zip(&record.distributions) {
        let mask = game.action_mask(state).unwrap();
        let sum: f32 = dist.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        for (a, &p) in dist.iter().enumerate() {
            if !mask.is_legal(a) {
                assert_eq!(p, 0.0);
            }
        }
    }
}

#[test]
fn replaying_moves_reproduces_the_result() {
    let game = ConnectK::connect_four();
    let record = play_game(&game, [&UniformPolicy, &UniformPolicy], &SelfPlayConfig::default())
        .unwrap();

    let mut state = game.start_state();
    for &action in &record.moves {
        state = game.next_state(&state, action).unwrap();
    }
    assert!(game.is_terminal(&state));
    assert_eq!(GameResult::from_winner(state.winner()), record.result);
}

#[test]
fn pentago_records_eight_variants_per_move() {
    let game = Pentago::new();
    let record = play_game(&game, [&UniformPolicy, &UniformPolicy], &SelfPlayConfig::default())
        .unwrap();
    assert_eq!(record.len(), 8 * record.num_moves());
    assert!(record.distributions.iter().all(|d| d.len() == 288));
}

#[test]
fn iteration_round_trips_through_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let game = ConnectK::connect_four();
    let batch = run_iteration(
        &game,
        [&UniformPolicy, &UniformPolicy],
        3,
        &SelfPlayConfig::default(),
    )
    .unwrap();
    assert_eq!(batch.num_games, 3);

    let paths = ArtifactPaths::new(dir.path(), "test", 4, 2);
    let prefix = paths.prefix(3, 0);
    save_artifact(&game, &batch, &prefix).unwrap();

    let artifact = load_artifact(&prefix).unwrap();
    assert_eq!(artifact.len(), batch.len());
    let examples = artifact.into_examples(1);
    assert_eq!(examples, batch.to_training_examples(&game, 1));
}
