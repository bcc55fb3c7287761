use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hypermut::filter::QualityFilter;
use hypermut::summary::ReadSummary;
use hypermut::{extract_substitutions, CenterBase, ContextSelection, CountMatrix};

const AMPLICON: &[u8] = b"CCTCAGATCACTCTTTGGCAACGACCCCTCGTCACAATAAAGATAGGGGGGCAACTAAAGGAAGCTCTATTAGATACAGGAGCAGATGATACAGTATTAGAAGAAATGAGTTTGCCAGGAAGATGGAAACCAAAAATGATAGGGGGAATTGGAGGTTTTATCAAAGTAAGACAGTATGATCAGATACTCATAGAAATCTGTGG";

fn hypermutated(reference: &[u8]) -> Vec<u8> {
    reference
        .iter()
        .enumerate()
        .map(|(i, nuc)| match nuc {
            b'G' if i % 3 == 0 => b'A',
            _ => *nuc,
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let mutant = hypermutated(AMPLICON);
    let filter = QualityFilter::default();

    c.bench_function("extract substitutions", |b| {
        b.iter(|| extract_substitutions(black_box(&mutant), black_box(AMPLICON), None))
    });
    c.bench_function("window substitutions", |b| {
        b.iter(|| filter.window_substitutions(black_box(&mutant), black_box(AMPLICON)))
    });

    let summaries = (0..1000)
        .map(|_| ReadSummary::new(&mutant, AMPLICON))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    c.bench_function("context matrix 1000 reads", |b| {
        b.iter(|| {
            CountMatrix::from_summaries(
                black_box(&summaries),
                CenterBase::Reference,
                ContextSelection::GToA,
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
