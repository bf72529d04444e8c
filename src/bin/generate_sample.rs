//! Writes `sample_viewings.parquet`: simulated viewing records for a three-arm
//! experiment, ready for `ab-report --label`.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

const OUTPUT_PATH: &str = "sample_viewings.parquet";
const USERS_PER_GROUP: usize = 400;

/// Arm name and mean share of the content watched.
const ARMS: [(&str, f64); 3] = [("control", 0.62), ("treatment", 0.74), ("variant_b", 0.64)];
const DURATIONS: [f64; 4] = [22.0, 30.0, 45.0, 60.0];
const DEVICES: [&str; 3] = ["tv", "mobile", "web"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut group = StringBuilder::new();
    let mut user_id = Int64Builder::new();
    let mut device = StringBuilder::new();
    let mut minutes = Float64Builder::new();
    let mut duration = Float64Builder::new();

    let mut next_user: i64 = 1000;
    for (arm, share) in ARMS {
        for _ in 0..USERS_PER_GROUP {
            let length = *rng.pick(&DURATIONS);
            // viewers occasionally keep the player running past the credits
            let watched = (rng.gauss(share, 0.25) * length).clamp(0.0, length * 1.1);

            group.append_value(arm);
            user_id.append_value(next_user);
            device.append_value(rng.pick(&DEVICES));
            minutes.append_value((watched * 10.0).round() / 10.0);
            duration.append_value(length);
            next_user += 1;
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("group", DataType::Utf8, false),
        Field::new("user_id", DataType::Int64, false),
        Field::new("device", DataType::Utf8, false),
        Field::new("minutes_watched", DataType::Float64, false),
        Field::new("content_duration", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(group.finish()),
            Arc::new(user_id.finish()),
            Arc::new(device.finish()),
            Arc::new(minutes.finish()),
            Arc::new(duration.finish()),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(OUTPUT_PATH)
        .with_context(|| format!("creating {OUTPUT_PATH}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {} viewings in {} groups to {OUTPUT_PATH}",
        batch.num_rows(),
        ARMS.len()
    );
    Ok(())
}
