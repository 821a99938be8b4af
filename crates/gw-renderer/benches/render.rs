//! Benchmarks for the wiki rendering pipeline.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gw_renderer::{RendererOptions, WikiRenderer};

/// Generate a page mixing headings, wiki links and arrow spans.
fn generate_page(sections: usize, paragraphs_per_section: usize) -> String {
    let mut md = String::with_capacity(sections * paragraphs_per_section * 200);
    md.push_str("# Page Title\n\n{{TOC}}\n\n");

    for i in 0..sections {
        md.push_str(&format!("## Section {i}\n\n"));
        for j in 0..paragraphs_per_section {
            md.push_str(&format!(
                "Paragraph {j} links to [[Page {i}-{j}]] and has <<marked<< text with **bold** words.\n\n"
            ));
        }
    }
    md
}

fn bench_render_simple(c: &mut Criterion) {
    let renderer = WikiRenderer::new(RendererOptions::default());

    c.bench_function("render_simple_page", |b| {
        b.iter(|| renderer.render("# Hello\n\nSimple content."));
    });
}

fn bench_render_varying_sizes(c: &mut Criterion) {
    let renderer = WikiRenderer::new(RendererOptions::default());
    let mut group = c.benchmark_group("render_by_size");

    for (sections, paragraphs) in [(5, 2), (20, 3), (50, 5)] {
        let page = generate_page(sections, paragraphs);
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("wiki", format!("{sections}s_{paragraphs}p")),
            &page,
            |b, page| b.iter(|| renderer.render(page)),
        );
    }

    group.finish();
}

fn bench_arrow_heavy(c: &mut Criterion) {
    let renderer = WikiRenderer::new(RendererOptions::default());
    let page = "<<a <<b<< c<< <<<d<< ".repeat(200);

    c.bench_function("render_arrow_heavy", |b| {
        b.iter(|| renderer.render(&page));
    });
}

criterion_group!(
    benches,
    bench_render_simple,
    bench_render_varying_sizes,
    bench_arrow_heavy
);
criterion_main!(benches);
