extern crate nnfit;

use nnfit::activator::Activator;
use nnfit::feed_forward::Network;
use nnfit::table::DataTable;
use nnfit::trainer::{Fit, FitOutcome, Logging, Trainer, TrainingSet};

const DATA: &str = "x,y,label\n\
                    100,20,low\n\
                    200,35,low\n\
                    300,55,mid\n\
                    400,70,mid\n\
                    500,80,high\n\
                    600,?,high\n\
                    700,95,high\n";

fn training_set() -> TrainingSet {
    let mut table = DataTable::parse(DATA, true).unwrap();
    let x = table.numeric_column_by_name("x").unwrap();
    let y = table.numeric_column_by_name("y").unwrap();
    TrainingSet::from_columns(&x, &y, 1000.0).unwrap()
}

fn network() -> Network {
    let mut network = Network::with_seed(4);
    network.set_num_inputs(1);
    network.set_num_outputs(1);
    network.set_output_unit_type(Activator::Linear);
    network.add_layer(4, Activator::Tanh, 2.0, 1.0, 1.0).unwrap();
    network
}

#[test]
fn table_columns_become_scaled_examples() {
    let set = training_set();
    assert_eq!(set.len(), 6);
    let (input, target) = set.iter().nth(2).unwrap();
    assert_eq!(input, &[0.3]);
    assert_eq!(target, &[0.055]);
}

#[test]
fn fit_improves_and_survives_a_model_round_trip() {
    let set = training_set();
    let mut network = network();
    let mut trainer = Trainer::new();
    trainer.set_learning_constant(0.1);
    trainer.replace_training_set(set.clone());

    // The error of the untrained network over one epoch.
    let mut probe = network.clone();
    let mut probe_trainer = trainer.clone();
    probe_trainer.run_epoch(&mut probe);
    let first_error = probe_trainer.network_error();

    let report = Fit::new()
        .max_epochs(200)
        .min_error(1e-9)
        .logging(Logging::Silent)
        .run(&mut trainer, &mut network)
        .unwrap();
    assert_eq!(report.outcome, FitOutcome::Exhausted);
    assert!(report.error <= first_error);

    let mut copy = Network::from_model_str(&network.to_model_string()).unwrap();
    for (input, _) in set.iter() {
        assert_eq!(network.response(input), copy.response(input));
    }
}

#[test]
fn fitting_is_reproducible() {
    let run = || {
        let mut network = network();
        let mut trainer = Trainer::with_seed(8);
        trainer.set_momentum(0.3);
        trainer.replace_training_set(training_set());
        let report = Fit::new()
            .max_epochs(25)
            .logging(Logging::Silent)
            .run(&mut trainer, &mut network)
            .unwrap();
        (report, network.to_model_string())
    };
    assert_eq!(run(), run());
}
