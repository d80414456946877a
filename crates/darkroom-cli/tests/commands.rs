//! End-to-end runs of the subcommands against a temporary directory.

use std::path::{Path, PathBuf};

use darkroom_cli::commands::edit::{self, EditArgs};
use darkroom_cli::commands::mono::{self, MonoArgs, MonoPresetArg};
use darkroom_cli::commands::params::{self, ParamsCommand, SectionArg};
use darkroom_cli::commands::presets::{self, PresetsCommand};
use darkroom_cli::commands::preview::{self, PreviewArgs};
use darkroom_cli::commands::transfer::{self, TransferArgs};
use darkroom_cli::commands::FormatArg;
use darkroom_cli::config::AppConfig;
use darkroom_core::export::{ExportOptions, encode, render};
use darkroom_core::transform::lut::DEFAULT_INTENSITY;
use darkroom_core::{EditParams, ExportFormat, Lut3D, PixelBuffer};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: AppConfig,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            preset_dir: dir.path().join("presets"),
            preview_edge: 1920,
            quality: 95,
        };
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_png(&self, name: &str, buffer: &PixelBuffer) -> PathBuf {
        let path = self.path(name);
        let bytes = encode(buffer, &ExportOptions::new(ExportFormat::Png)).unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn write_params(&self, name: &str, params: &EditParams) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, params.to_json_pretty().unwrap()).unwrap();
        path
    }
}

fn read_png(path: &Path) -> PixelBuffer {
    PixelBuffer::from(image::open(path).unwrap().to_rgba8())
}

fn gradient(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        [(x * 255 / width) as u8, (y * 255 / height) as u8, 120, 255]
    })
}

fn edit_args(input: PathBuf, output: PathBuf) -> EditArgs {
    EditArgs {
        input,
        output,
        params: None,
        preset: None,
        format: None,
        lut: None,
        intensity: DEFAULT_INTENSITY,
    }
}

#[test]
fn test_edit_with_defaults_is_lossless_png() {
    let ws = Workspace::new();
    let src = gradient(24, 16);
    let input = ws.write_png("in.png", &src);
    let output = ws.path("out/edited.png");

    edit::run(edit_args(input, output.clone()), &ws.config).unwrap();
    assert_eq!(read_png(&output), src);
}

#[test]
fn test_edit_matches_core_render() {
    let ws = Workspace::new();
    let src = gradient(20, 12);
    let input = ws.write_png("in.png", &src);
    let mut params = EditParams::default();
    params.light.contrast = 25.0;
    params.geometry.flip_v = true;
    params.effects.vignette = -30.0;

    let mut args = edit_args(input, ws.path("out.png"));
    args.params = Some(ws.write_params("look.json", &params));
    edit::run(args, &ws.config).unwrap();

    assert_eq!(read_png(&ws.path("out.png")), render(&src, &params));
}

#[test]
fn test_edit_explicit_jpeg_format() {
    let ws = Workspace::new();
    let input = ws.write_png("in.png", &gradient(8, 8));
    let mut args = edit_args(input, ws.path("out.bin"));
    args.format = Some(FormatArg::Jpeg);
    edit::run(args, &ws.config).unwrap();

    let bytes = std::fs::read(ws.path("out.bin")).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_preview_downscales_and_uses_last_request() {
    let ws = Workspace::new();
    let input = ws.write_png("in.png", &gradient(40, 20));

    let mut first = EditParams::default();
    first.light.exposure = 2.0;
    let last = EditParams::default();

    let output = ws.path("preview.png");
    preview::run(
        PreviewArgs {
            input,
            output: output.clone(),
            params: vec![
                ws.write_params("a.json", &first),
                ws.write_params("b.json", &first),
                ws.write_params("c.json", &last),
            ],
            preset: None,
            max_edge: Some(20),
            show_original: false,
            format: None,
        },
        &ws.config,
    )
    .unwrap();

    let out = read_png(&output);
    assert_eq!(out.dimensions(), (20, 10));
    let downscaled = gradient(40, 20).resized_to_fit(20);
    assert_eq!(out, downscaled);
}

#[test]
fn test_transfer_learns_saves_and_reuses_lut() {
    let ws = Workspace::new();
    let reference = ws.write_png("ref.png", &PixelBuffer::filled(6, 6, [200, 60, 30, 255]));
    let target = ws.write_png("target.png", &gradient(10, 10));
    let cube = ws.path("look.cube");

    transfer::run(
        TransferArgs {
            reference: Some(reference),
            lut: None,
            target: Some(target.clone()),
            output: Some(ws.path("graded.png")),
            intensity: 100.0,
            save_lut: Some(cube.clone()),
            format: None,
        },
        &ws.config,
    )
    .unwrap();

    let graded = read_png(&ws.path("graded.png"));
    for px in graded.pixels() {
        assert!(px[0].abs_diff(200) <= 1 && px[2].abs_diff(30) <= 1, "{px:?}");
    }
    assert_eq!(Lut3D::load_cube(&cube).unwrap().size(), 16);

    transfer::run(
        TransferArgs {
            reference: None,
            lut: Some(cube),
            target: Some(target),
            output: Some(ws.path("regraded.png")),
            intensity: 100.0,
            save_lut: None,
            format: None,
        },
        &ws.config,
    )
    .unwrap();
    let regraded = read_png(&ws.path("regraded.png"));
    for (a, b) in regraded.pixels().iter().zip(graded.pixels()) {
        for c in 0..3 {
            assert!(a[c].abs_diff(b[c]) <= 1);
        }
    }
}

#[test]
fn test_transfer_without_outputs_fails() {
    let ws = Workspace::new();
    let reference = ws.write_png("ref.png", &gradient(4, 4));
    let result = transfer::run(
        TransferArgs {
            reference: Some(reference),
            lut: None,
            target: None,
            output: None,
            intensity: DEFAULT_INTENSITY,
            save_lut: None,
            format: None,
        },
        &ws.config,
    );
    assert!(result.is_err());
}

#[test]
fn test_preset_lifecycle() {
    let ws = Workspace::new();
    let mut params = EditParams::default();
    params.color.saturation = -35.0;
    params.geometry.flip_h = true;
    let file = ws.write_params("look.json", &params);

    let mut out = Vec::new();
    presets::run(
        PresetsCommand::Save {
            name: "Faded".into(),
            params: Some(file),
        },
        &ws.config,
        &mut out,
    )
    .unwrap();

    let mut out = Vec::new();
    presets::run(PresetsCommand::List, &ws.config, &mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();
    assert!(listing.contains("built-in  Natural"));
    assert!(listing.contains("saved     Faded"));

    let mut out = Vec::new();
    presets::run(PresetsCommand::Show { name: "Faded".into() }, &ws.config, &mut out).unwrap();
    let shown = EditParams::from_json(&String::from_utf8(out).unwrap()).unwrap();
    assert_eq!(shown.color.saturation, -35.0);
    assert!(!shown.geometry.flip_h);

    // Applying the saved look through `edit --preset`.
    let input = ws.write_png("in.png", &gradient(6, 6));
    let mut args = edit_args(input, ws.path("faded.png"));
    args.preset = Some("Faded".into());
    edit::run(args, &ws.config).unwrap();
    assert_eq!(read_png(&ws.path("faded.png")), render(&gradient(6, 6), &shown));

    let mut out = Vec::new();
    presets::run(PresetsCommand::Delete { name: "Faded".into() }, &ws.config, &mut out).unwrap();
    let mut out = Vec::new();
    assert!(presets::run(PresetsCommand::Delete { name: "Faded".into() }, &ws.config, &mut out).is_err());
}

#[test]
fn test_params_init_check_reset() {
    let ws = Workspace::new();
    let doc = ws.path("doc.json");
    let mut out = Vec::new();
    params::run(ParamsCommand::Init { output: Some(doc.clone()) }, &mut out).unwrap();
    let init = EditParams::from_json(&std::fs::read_to_string(&doc).unwrap()).unwrap();
    assert_eq!(init, EditParams::default());

    std::fs::write(&doc, r#"{"light":{"exposure":9,"contrast":10},"detail":{"sharpen":30}}"#).unwrap();
    let mut out = Vec::new();
    params::run(ParamsCommand::Check { file: doc.clone() }, &mut out).unwrap();
    let checked = EditParams::from_json(&String::from_utf8(out).unwrap()).unwrap();
    assert_eq!(checked.light.exposure, 5.0);

    let mut out = Vec::new();
    params::run(
        ParamsCommand::Reset {
            file: doc.clone(),
            section: SectionArg::Light,
            output: None,
        },
        &mut out,
    )
    .unwrap();
    let reset = EditParams::from_json(&std::fs::read_to_string(&doc).unwrap()).unwrap();
    assert_eq!(reset.light, Default::default());
    assert_eq!(reset.detail.sharpen, 30.0);
}

#[test]
fn test_mono_writes_gray_copy_beside_input() {
    let ws = Workspace::new();
    let input = ws.write_png("beach.png", &gradient(12, 8));
    mono::run(
        MonoArgs {
            input,
            output: None,
            params: None,
            preset: Some(MonoPresetArg::Clean),
            intensity: Some(100.0),
            contrast: Some(0.0),
            brightness: Some(0.0),
            grain: None,
            average: true,
            format: None,
        },
        &ws.config,
    )
    .unwrap();

    let out = read_png(&ws.path("beach-grayscale.png"));
    assert_eq!(out.dimensions(), (12, 8));
    for (px, src) in out.pixels().iter().zip(gradient(12, 8).pixels()) {
        let avg = (src[0] as f32 + src[1] as f32 + src[2] as f32) / 3.0;
        assert_eq!(px[0], avg.round() as u8);
        assert!(px[0] == px[1] && px[1] == px[2]);
        assert_eq!(px[3], src[3]);
    }
}
