use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use reading_report::{parse, LangMode};
use reading_report_render::{LayoutConfig, LayoutEngine, ReportContext};

/// (fixture name, bullets per note section)
const FIXTURES: &[(&str, usize)] = &[("short", 3), ("typical", 12), ("long", 80)];

struct TrackingAllocator;

static CURRENT_ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL_ALLOCATOR: TrackingAllocator = TrackingAllocator;

fn current_alloc_bytes() -> usize {
    CURRENT_ALLOC_BYTES.load(Ordering::Relaxed)
}

fn peak_alloc_bytes() -> usize {
    PEAK_ALLOC_BYTES.load(Ordering::Relaxed)
}

fn reset_peak_alloc_bytes() {
    PEAK_ALLOC_BYTES.store(current_alloc_bytes(), Ordering::Relaxed);
}

fn add_current_alloc_bytes(delta: usize) {
    let current = CURRENT_ALLOC_BYTES.fetch_add(delta, Ordering::Relaxed) + delta;
    PEAK_ALLOC_BYTES.fetch_max(current, Ordering::Relaxed);
}

fn sub_current_alloc_bytes(delta: usize) {
    let _ = CURRENT_ALLOC_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(delta))
    });
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            add_current_alloc_bytes(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        sub_current_alloc_bytes(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                add_current_alloc_bytes(new_size - layout.size());
            } else {
                sub_current_alloc_bytes(layout.size() - new_size);
            }
        }
        new_ptr
    }
}

#[derive(Clone, Debug)]
struct CaseResult {
    fixture: String,
    case: String,
    iterations: usize,
    min_ns: u128,
    median_ns: u128,
    max_ns: u128,
    median_peak_heap_bytes: usize,
}

fn english_answer(bullets: usize) -> String {
    let mut raw = String::from("Here is the evaluation.\n**SCORES_START**\n");
    for (idx, label) in ["Pronunciation", "Fluency", "Accuracy", "Comprehension"]
        .iter()
        .enumerate()
    {
        raw.push_str(&format!("- **{label}** | {}/25\n", 15 + idx));
    }
    raw.push_str("Overall Level | High\nSCORES_END\nNOTES_START\n");
    for section in ["Error Analysis", "Performance Overview", "Recommendations"] {
        raw.push_str(&format!("### {section}\n"));
        for n in 0..bullets {
            raw.push_str(&format!(
                "* Observation {n}: the reader hesitated before multi-syllable words and self-corrected twice.\n"
            ));
        }
    }
    raw.push_str("NOTES_END\n");
    raw
}

fn arabic_answer(bullets: usize) -> String {
    let mut raw = String::new();
    for label in ["الوعي الصوتي", "قراءة الكلمات", "الطلاقة"] {
        raw.push_str(&format!("{label}|20/25\n"));
    }
    raw.push_str("التقييم العام|عالي\n");
    for section in ["تحليل الأخطاء", "مؤشرات الأداء", "التوصيات"] {
        raw.push_str(&format!("[{section}]\n"));
        for _ in 0..bullets {
            raw.push_str("• قرأ الطالب النص بثقة مع بعض التردد في الكلمات الطويلة\n");
        }
    }
    raw
}

fn run_case<F>(fixture: &str, case: &str, warmup: usize, iters: usize, mut op: F) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup {
        black_box(op());
    }
    let mut time_samples = Vec::with_capacity(iters);
    let mut mem_samples = Vec::with_capacity(iters);
    for _ in 0..iters {
        let baseline = current_alloc_bytes();
        reset_peak_alloc_bytes();
        let start = Instant::now();
        black_box(op());
        time_samples.push(start.elapsed().as_nanos());
        mem_samples.push(peak_alloc_bytes().saturating_sub(baseline));
    }
    time_samples.sort_unstable();
    mem_samples.sort_unstable();
    CaseResult {
        fixture: fixture.to_string(),
        case: case.to_string(),
        iterations: iters,
        min_ns: time_samples[0],
        median_ns: time_samples[time_samples.len() / 2],
        max_ns: time_samples[time_samples.len() - 1],
        median_peak_heap_bytes: mem_samples[mem_samples.len() / 2],
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup = if quick { 1 } else { 5 };
    let iters = if quick { 5 } else { 50 };

    println!("# reading-report benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup,
        iters
    );
    println!("fixture,case,iterations,min_ns,median_ns,max_ns,median_peak_heap_bytes");

    let engine = LayoutEngine::new(LayoutConfig::default())
        .unwrap_or_else(|e| panic!("layout config: {}", e));
    let ctx = ReportContext::new("Benchmark", "2024-01-01")
        .with_reference("The quick brown fox jumps over the lazy dog. ".repeat(8));

    let mut results = Vec::new();
    for (fixture, bullets) in FIXTURES {
        let en = english_answer(*bullets);
        let ar = arabic_answer(*bullets);

        results.push(run_case(fixture, "parse_en", warmup, iters, || {
            parse(&en, LangMode::English).scores().len()
        }));
        results.push(run_case(fixture, "parse_ar", warmup, iters, || {
            parse(&ar, LangMode::Arabic).scores().len()
        }));

        let en_record = parse(&en, LangMode::English);
        let ar_record = parse(&ar, LangMode::Arabic);
        results.push(run_case(fixture, "render_en", warmup, iters, || {
            engine.render(&en_record, LangMode::English, &ctx).len()
        }));
        results.push(run_case(fixture, "render_ar", warmup, iters, || {
            engine.render(&ar_record, LangMode::Arabic, &ctx).len()
        }));
    }

    for r in &results {
        println!(
            "{},{},{},{},{},{},{}",
            r.fixture, r.case, r.iterations, r.min_ns, r.median_ns, r.max_ns, r.median_peak_heap_bytes
        );
    }
}
