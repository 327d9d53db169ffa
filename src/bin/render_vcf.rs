use anyhow::Context;
use dasp_sample::Sample;
use quad_vcf::filters::FilterType;
use quad_vcf::params::{FREQUENCY, RESONANCE, VCF_SUBTYPE, VCF_TYPE};
use quad_vcf::ports::{INPUT_L, INPUT_R, OUTPUT_L, OUTPUT_R};
use quad_vcf::{ProcessorConfig, VcfProcessor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLE_RATE: f32 = 48_000.0;
const SECONDS_PER_TYPE: f32 = 1.5;
const CHORD: [f32; 3] = [110.0, 138.59, 164.81];
const OUTPUT_SCALE: f32 = 0.1;

struct SawVoice {
    phase: f32,
    increment: f32,
}

impl SawVoice {
    fn new(frequency: f32) -> Self {
        Self {
            phase: 0.0,
            increment: frequency / SAMPLE_RATE,
        }
    }

    /// Next sample in volts (±5 V).
    fn next(&mut self) -> f32 {
        let out = self.phase * 10.0 - 5.0;
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vcf_render.wav".to_string());

    let mut vcf = VcfProcessor::new(ProcessorConfig {
        sample_rate: SAMPLE_RATE,
        ..ProcessorConfig::default()
    })
    .context("failed to create VCF")?;
    vcf.inputs[INPUT_L].connect(CHORD.len());
    vcf.inputs[INPUT_R].connect(1);
    vcf.params.set(RESONANCE, 0.6);

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)
        .with_context(|| format!("failed to create {}", path))?;

    let mut voices: Vec<SawVoice> = CHORD.iter().map(|f| SawVoice::new(*f)).collect();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let frames_per_type = (SAMPLE_RATE * SECONDS_PER_TYPE) as usize;

    println!("=== RENDERING VCF SWEEP ===");
    for filter_type in FilterType::ALL {
        let subtype = vcf.default_subtype(filter_type);
        println!("  - {} (subtype {})", filter_type.name(), subtype);
        vcf.params.set(VCF_TYPE, filter_type.index() as f32);
        vcf.params.set(VCF_SUBTYPE, subtype as f32);

        for n in 0..frames_per_type {
            // cutoff sweeps from -36 to +36 semitones around A4
            let t = n as f32 / frames_per_type as f32;
            vcf.params.set(FREQUENCY, -36.0 + 72.0 * t);

            for (ch, voice) in voices.iter_mut().enumerate() {
                vcf.inputs[INPUT_L].set_voltage(voice.next(), ch);
            }
            vcf.inputs[INPUT_R].set_voltage(rng.random_range(-5.0..5.0), 0);
            vcf.process();

            let left: f32 = (0..CHORD.len())
                .map(|ch| vcf.outputs[OUTPUT_L].voltage(ch))
                .sum();
            let right = vcf.outputs[OUTPUT_R].voltage(0);
            for sample in [left, right] {
                let clipped = (sample * OUTPUT_SCALE).clamp(-1.0, 1.0);
                writer
                    .write_sample(i16::from_sample(clipped))
                    .context("failed to write sample")?;
            }
        }
    }

    writer.finalize().context("failed to finalize WAV")?;
    println!(
        "\nWrote {} ({} reconfigurations, {} voices on {} quad units)",
        path,
        vcf.reconfiguration_count(),
        vcf.allocation().n_voices(),
        vcf.allocation().n_simd_slots()
    );
    Ok(())
}
