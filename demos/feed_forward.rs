extern crate nnfit;
extern crate rand;

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

type Input = Vec<f64>;
type Output = Vec<f64>;

/// Points near the unit circle, labelled by whether they lie in the first or
/// third quadrant. The last input is a constant bias.
fn generate_data(num_samples: usize, rng: &mut ChaCha8Rng) -> Vec<(Input, Output)> {
    let radians = Uniform::new(0.0, 2.0 * std::f64::consts::PI);
    let noise = Uniform::new_inclusive(-0.1, 0.1);

    let mut data = Vec::new();
    for _ in 0..num_samples {
        let theta = radians.sample(rng);
        let dx = noise.sample(rng);
        let dy = noise.sample(rng);
        let point = vec![theta.cos() + dx, theta.sin() + dy, 1.0];
        let class = if point[0] * point[1] > 0.0 {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        };
        data.push((point, class));
    }
    data
}

fn score(set_name: &str,
         test_data: &[(Input, Output)],
         network: &mut nnfit::feed_forward::Network) {
    let mut num_correct = 0;
    for (input, expected) in test_data {
        let output = match network.response(input) {
            Some(output) => output,
            None => continue,
        };
        let class = if output[0] > output[1] { 0 } else { 1 };
        if expected[class] == 1.0 {
            num_correct += 1;
        }
    }
    println!("{} set results: {} of {} correct",
             set_name,
             num_correct,
             test_data.len());
}

fn main() -> nnfit::Result<()> {
    use nnfit::activator::Activator;
    use nnfit::feed_forward::Network;
    use nnfit::trainer::*;

    env_logger::init();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let training_data = generate_data(1_000, &mut rng);

    let mut network = Network::new();
    network.set_num_inputs(3);
    network.set_num_outputs(2);
    network.set_output_unit_type(Activator::Unipolar);
    network.add_layer(5, Activator::Tanh, 2.0, 1.0, 1.0)?;
    network.add_layer(5, Activator::Tanh, 2.0, 1.0, 1.0)?;

    let mut trainer = Trainer::new();
    trainer.set_learning_constant(0.1);
    trainer.set_momentum(0.5);
    for (input, output) in &training_data {
        trainer.add_training_example(input.clone(), output.clone());
    }

    let report = Fit::new()
        .max_epochs(200)
        .min_error(10.0)
        .logging(Logging::Iterations(20))
        .run(&mut trainer, &mut network)?;

    println!("{:?} after {} epochs", report.outcome, report.epochs);
    score("Training", &training_data, &mut network);
    score("Test", &generate_data(500, &mut rng), &mut network);
    Ok(())
}
