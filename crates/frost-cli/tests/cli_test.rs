use std::process::Command;

fn frost(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_frost"))
        .args(args)
        .env("RUST_LOG", "debug")
        .output()
        .expect("failed to spawn frost")
}

#[test]
fn plan_json_lists_every_step() {
    let output = frost(&["plan", "1920", "1080", "--iterations", "3", "--json"]);
    assert!(output.status.success(), "plan failed: {:?}", output.status);

    let steps: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    let sizes: Vec<(u64, u64)> = steps
        .as_array()
        .expect("expected an array of steps")
        .iter()
        .map(|s| (s["width"].as_u64().unwrap(), s["height"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        sizes,
        vec![(960, 540), (480, 270), (240, 135), (480, 270), (960, 540), (1920, 1080)]
    );
}

#[test]
fn graph_json_stays_clean_with_debug_logging() {
    let output = frost(&["graph", "64", "64", "--variant", "per-step", "--json"]);
    assert!(output.status.success(), "graph failed: {:?}", output.status);

    let stdout = String::from_utf8(output.stdout).expect("stdout not utf-8");
    let graph: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is not pure JSON");
    let passes = graph["passes"].as_array().expect("passes missing");
    assert_eq!(passes.len(), 6);
    assert_eq!(passes[0]["name"], "Blur UI Mipmap_0");
    assert_eq!(graph["native_passes"].as_array().map(Vec::len), Some(6));
}

#[test]
fn blur_rejects_missing_input() {
    let output = frost(&["blur", "no_such_image.png", "-o", "out.png"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no_such_image.png"), "stderr: {stderr}");
}

#[test]
fn blur_writes_an_image_of_the_same_size() {
    let dir = std::env::temp_dir().join(format!("frost_cli_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("checker.png");
    let output_path = dir.join("out/blurred.png");

    let checker = image::RgbaImage::from_fn(32, 24, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    });
    checker.save(&input).unwrap();

    let output = frost(&[
        "blur",
        input.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--iterations",
        "2",
        "--variant",
        "per-step",
    ]);
    assert!(output.status.success(), "blur failed: {}", String::from_utf8_lossy(&output.stderr));

    let blurred = image::open(&output_path).unwrap().to_rgba8();
    std::fs::remove_dir_all(&dir).ok();
    assert_eq!(blurred.dimensions(), (32, 24));
    assert_ne!(blurred.as_raw(), checker.as_raw());
}
