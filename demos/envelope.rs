//! Envelope Example
//!
//! Fires a single AD envelope from a trigger, prints its end-of-attack and
//! end-of-release gates, then switches to Frequency mode to show four ramps
//! running at polyrhythmic ratios.
//!
//! Run with: cargo run --example envelope

use ebb::prelude::*;

fn main() {
    let sample_rate = 48000.0;
    let mut gen = RampGenerator::new(sample_rate);

    // Half-second envelope: Medium range (2 Hz) with a short attack
    let controls = Controls::new()
        .with_ramp_mode(RampMode::Ad)
        .with_output_mode(OutputMode::Gates)
        .with_slope(0.2)
        .with_shape(0.8)
        .with_shift(1.0);
    gen.snap_params(&controls);

    // One trigger at the first sample, then the gate stays low
    let len = (sample_rate * 0.6) as usize;
    let mut trigger = vec![0.0; len];
    trigger[0] = 1.0;
    let inputs = BlockInputs {
        gate: Some(&trigger),
        ..Default::default()
    };

    let mut block = vec![[0.0; NUM_CHANNELS]; len];
    gen.process_block(&controls, &inputs, &mut block);

    println!("AD envelope");
    let mut peak = 0.0_f64;
    let mut eoa = None;
    let mut eor = None;
    for (i, frame) in block.iter().enumerate() {
        peak = peak.max(frame[0]);
        if eoa.is_none() && frame[2] > 0.0 {
            eoa = Some(i);
        }
        if eor.is_none() && frame[3] > 0.0 {
            eor = Some(i);
        }
        if i % 2400 == 0 {
            println!("  {:>6.1} ms  env {:>5.2} V", i as f64 / sample_rate * 1000.0, frame[0]);
        }
    }
    println!("  peak: {:.2} V", peak);
    if let Some(i) = eoa {
        println!("  end of attack at {:.1} ms", i as f64 / sample_rate * 1000.0);
    }
    if let Some(i) = eor {
        println!("  end of release at {:.1} ms", i as f64 / sample_rate * 1000.0);
    }
    println!("  stage after block: {:?}", gen.stage(0));
    println!();

    // Frequency mode: shift 0 selects ratios 1, 1/2, 1/4, 1/8
    let controls = Controls::new()
        .with_ramp_mode(RampMode::Cycle)
        .with_output_mode(OutputMode::Frequency)
        .with_shift(0.0);
    gen.snap_params(&controls);

    let mut block = vec![[0.0; NUM_CHANNELS]; 24000];
    gen.process_block(&controls, &BlockInputs::default(), &mut block);

    println!("Frequency mode, half a second at 2 Hz");
    for channel in 0..NUM_CHANNELS {
        println!("  out {}: phase {:.4}", channel + 1, gen.phase(channel));
    }
}
