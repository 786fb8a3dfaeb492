//! Response rendering: JSON envelope, plain text or per-page CSV.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use pdflens_core::report::{ImagesReport, InfoReport, OcrTextReport, StructureReport, TextReport};
use pdflens_core::{OperationResult, Response};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON response envelope
    Json,
    /// Plain text summary
    Text,
    /// One CSV row per page (or per image for extract-images)
    Csv,
}

/// Output options shared by the operation commands.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Render and write a response. Failures are always rendered as JSON.
pub fn emit(response: &Response, args: &OutputArgs) -> anyhow::Result<()> {
    let rendered = match (response, args.format) {
        (Response::Success { result, .. }, OutputFormat::Text) => format_text(result),
        (Response::Success { result, .. }, OutputFormat::Csv) => format_csv(result)?,
        _ => serde_json::to_string_pretty(response)?,
    };

    if let Some(path) = &args.output {
        fs::write(path, &rendered)?;
        eprintln!("{} Output written to {}", style("✓").green(), path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

pub fn format_text(result: &OperationResult) -> String {
    match result {
        OperationResult::Text(report) => text_report(report),
        OperationResult::Images(report) => images_report(report),
        OperationResult::OcrText(report) => ocr_report(report),
        OperationResult::Info(report) => info_report(report),
        OperationResult::Structure(report) => structure_report(report),
    }
}

fn text_report(report: &TextReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Pages {} of {} ({} words)\n",
        report.pages_processed, report.total_pages, report.total_word_count
    ));
    for page in &report.pages_text {
        output.push_str(&format!("\n--- Page {} ---\n", page.page_number));
        output.push_str(page.text.trim_end());
        output.push('\n');
    }
    output
}

fn images_report(report: &ImagesReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Pages {}: {} images extracted, {} filtered, {} with text\n",
        report.pages_processed,
        report.summary.total_images,
        report.summary.images_filtered,
        report.summary.images_with_text
    ));
    if let Some(dir) = &report.output_directory {
        output.push_str(&format!("Saved to {}\n", dir.display()));
    }

    for image in &report.images {
        output.push_str(&format!(
            "\n{} ({}x{}, {} bytes)\n",
            image.filename, image.width, image.height, image.size_bytes
        ));
        if let Some(analysis) = &image.analysis {
            output.push_str(&format!("  {}\n", analysis.description));
        }
    }
    output
}

fn ocr_report(report: &OcrTextReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Pages {} of {}: {} text words, {} OCR words\n",
        report.pages_processed,
        report.total_pages,
        report.summary.total_text_word_count,
        report.summary.total_ocr_word_count
    ));
    for page in &report.pages_data {
        output.push_str(&format!("\n--- Page {} ---\n", page.page_number));
        output.push_str(page.combined_text.trim_end());
        output.push('\n');
    }
    output
}

fn info_report(report: &InfoReport) -> String {
    let meta = &report.pdf_metadata;
    let stats = &report.document_stats;
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut output = String::new();
    output.push_str(&format!("Title:     {}\n", field(&meta.title)));
    output.push_str(&format!("Author:    {}\n", field(&meta.author)));
    output.push_str(&format!("Producer:  {}\n", field(&meta.producer)));
    output.push_str(&format!(
        "Created:   {}\n",
        meta.created_at
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| field(&meta.creation_date))
    ));
    output.push_str(&format!("Size:      {} MB\n", report.file_info.size_mb));
    output.push_str(&format!("Version:   {}\n", stats.pdf_version));
    output.push_str(&format!("Encrypted: {}\n", stats.is_encrypted));
    output.push_str(&format!(
        "Pages:     {} ({} with text, {} with images)\n",
        stats.total_pages, stats.pages_with_text, stats.pages_with_images
    ));
    output.push_str(&format!("Images:    {}\n", stats.total_images));
    output
}

fn structure_report(report: &StructureReport) -> String {
    let dist = &report.summary.content_distribution;
    let mut output = String::new();
    output.push_str(&format!(
        "{} pages: {} text only, {} images only, {} mixed, {} empty\n",
        report.document_structure.total_pages,
        dist.text_only_pages,
        dist.images_only_pages,
        dist.mixed_content_pages,
        dist.empty_pages
    ));
    output.push_str(&format!(
        "Average per page: {} images, {} text blocks\n",
        report.summary.avg_images_per_page, report.summary.avg_text_blocks_per_page
    ));
    for page in &report.page_details {
        output.push_str(&format!(
            "  page {:>4}  {:<12} {:>3} blocks {:>3} images\n",
            page.page_number,
            page.content_type.as_str(),
            page.text_blocks,
            page.image_count
        ));
    }
    output
}

pub fn format_csv(result: &OperationResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    match result {
        OperationResult::Text(report) => {
            wtr.write_record(["page_number", "word_count", "text"])?;
            for page in &report.pages_text {
                wtr.write_record([
                    page.page_number.to_string(),
                    page.word_count.to_string(),
                    page.text.clone(),
                ])?;
            }
        }
        OperationResult::Images(report) => {
            wtr.write_record([
                "page_number",
                "image_index",
                "filename",
                "width",
                "height",
                "size_bytes",
                "path",
                "ocr_text",
                "caption",
            ])?;
            for image in &report.images {
                let caption = image
                    .analysis
                    .as_ref()
                    .and_then(|a| a.caption.clone())
                    .unwrap_or_default();
                wtr.write_record([
                    image.page_number.to_string(),
                    image.image_index.to_string(),
                    image.filename.clone(),
                    image.width.to_string(),
                    image.height.to_string(),
                    image.size_bytes.to_string(),
                    image.path.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
                    image.ocr_text().unwrap_or_default().to_string(),
                    caption,
                ])?;
            }
        }
        OperationResult::OcrText(report) => {
            wtr.write_record(["page_number", "text_word_count", "ocr_word_count", "images_with_text", "combined_text"])?;
            for page in &report.pages_data {
                wtr.write_record([
                    page.page_number.to_string(),
                    page.text_word_count.to_string(),
                    page.ocr_word_count.to_string(),
                    page.images_with_text.len().to_string(),
                    page.combined_text.clone(),
                ])?;
            }
        }
        OperationResult::Info(report) => {
            wtr.write_record(["page_number", "images_count", "text_length", "has_text", "page_width", "page_height"])?;
            for page in &report.page_details {
                wtr.write_record([
                    page.page_number.to_string(),
                    page.images_count.to_string(),
                    page.text_length.to_string(),
                    page.has_text.to_string(),
                    page.page_width.map(|w| w.to_string()).unwrap_or_default(),
                    page.page_height.map(|h| h.to_string()).unwrap_or_default(),
                ])?;
            }
        }
        OperationResult::Structure(report) => {
            wtr.write_record([
                "page_number",
                "content_type",
                "text_blocks",
                "image_count",
                "text_length",
                "width",
                "height",
                "rotation",
            ])?;
            for page in &report.page_details {
                wtr.write_record([
                    page.page_number.to_string(),
                    page.content_type.as_str().to_string(),
                    page.text_blocks.to_string(),
                    page.image_count.to_string(),
                    page.text_length.to_string(),
                    page.dimensions.map(|d| d.width.to_string()).unwrap_or_default(),
                    page.dimensions.map(|d| d.height.to_string()).unwrap_or_default(),
                    page.rotation.to_string(),
                ])?;
            }
        }
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}
