use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a PDF with one text line per page and an optional flat gray image.
fn write_pdf(dir: &Path, pages: &[(&str, Option<(u32, u32)>)]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for (text, image) in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut xobjects = lopdf::Dictionary::new();
        if let Some((w, h)) = image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *w as i64,
                    "Height" => *h as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![128; (w * h) as usize],
            ));
            xobjects.set("Im1", image_id);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("sample.pdf");
    doc.save(&path).unwrap();
    path
}

/// A pdflens command isolated from the user's config directory.
fn pdflens(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pdflens").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

fn json_stdout(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn test_help_lists_operations() {
    let home = TempDir::new().unwrap();
    pdflens(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("read-text"))
        .stdout(predicate::str::contains("extract-images"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_read_text_page_range() {
    let home = TempDir::new().unwrap();
    let pages: Vec<(&str, Option<(u32, u32)>)> = (0..6).map(|_| ("Some words here", None)).collect();
    let pdf = write_pdf(home.path(), &pages);

    let output = pdflens(&home)
        .args(["read-text", "--start", "5", "--end", "2"])
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(response["success"], true);
    assert_eq!(response["operation"], "read-text");
    assert_eq!(response["result"]["pages_processed"], "2-5");
    assert_eq!(response["result"]["total_pages"], 6);
    assert_eq!(response["result"]["pages_text"].as_array().unwrap().len(), 4);
}

#[test]
fn test_read_text_csv() {
    let home = TempDir::new().unwrap();
    let pdf = write_pdf(home.path(), &[("Alpha", None), ("Beta", None)]);

    pdflens(&home)
        .args(["read-text", "--format", "csv"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("page_number,word_count,text"));
}

#[test]
fn test_missing_file_fails_with_envelope() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.pdf");

    let output = pdflens(&home)
        .arg("info")
        .arg(&missing)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(response["success"], false);
    assert_eq!(response["error"]["kind"], "source_error");
}

#[test]
fn test_path_and_url_rejected() {
    let home = TempDir::new().unwrap();
    let pdf = write_pdf(home.path(), &[("x", None)]);

    pdflens(&home)
        .arg("structure")
        .arg(&pdf)
        .args(["--url", "https://example.com/a.pdf"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid_argument"));
}

#[test]
fn test_not_a_pdf_is_decode_error() {
    let home = TempDir::new().unwrap();
    let bogus = home.path().join("notes.pdf");
    std::fs::write(&bogus, "plain text, not a PDF").unwrap();

    pdflens(&home)
        .arg("read-text")
        .arg(&bogus)
        .assert()
        .failure()
        .stdout(predicate::str::contains("decode_error"));
}

#[test]
fn test_extract_images_saves_files() {
    let home = TempDir::new().unwrap();
    let pdf = write_pdf(home.path(), &[("Cover", Some((120, 90))), ("Icon", Some((16, 16)))]);
    let out = home.path().join("images");

    let output = pdflens(&home)
        .args(["extract-images", "--no-analyze", "--output-dir"])
        .arg(&out)
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(response["result"]["images_extracted"], 1);
    assert_eq!(response["result"]["summary"]["images_filtered"], 1);
    assert_eq!(response["result"]["images"][0]["filename"], "page1_img1.png");
    assert!(out.join("page1_img1.png").exists());
    assert!(!out.join("page2_img1.png").exists());
}

#[test]
fn test_structure_text_format() {
    let home = TempDir::new().unwrap();
    let pdf = write_pdf(home.path(), &[("Words", Some((100, 100))), ("More", None)]);

    pdflens(&home)
        .args(["structure", "--format", "text"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pages"));
}

#[test]
fn test_serve_answers_each_line() {
    let home = TempDir::new().unwrap();
    let pdf = write_pdf(home.path(), &[("Hello", None)]);
    let input = format!(
        "{}\n{}\n",
        serde_json::json!({"operation": "get-info", "file_path": pdf}),
        serde_json::json!({"operation": "read-text"}),
    );

    let output = pdflens(&home)
        .arg("serve")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["success"], true);
    assert_eq!(lines[0]["result"]["document_stats"]["total_pages"], 1);
    assert_eq!(lines[1]["success"], false);
    assert_eq!(lines[1]["error"]["kind"], "invalid_argument");
}

#[test]
fn test_config_init_get_set() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("pdflens.json");
    let config_arg = config.display().to_string();

    pdflens(&home)
        .args(["--config", &config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    pdflens(&home)
        .args(["--config", &config_arg, "config", "set", "ocr.language", "deu"])
        .assert()
        .success();

    pdflens(&home)
        .args(["--config", &config_arg, "config", "get", "ocr.language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deu\""));

    pdflens(&home)
        .args(["--config", &config_arg, "config", "set", "pdf.min_image_width", "not-a-number"])
        .assert()
        .failure();
}

#[test]
fn test_config_path_uses_config_dir() {
    let home = TempDir::new().unwrap();

    pdflens(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pdflens"))
        .stdout(predicate::str::contains("not created"));
}
