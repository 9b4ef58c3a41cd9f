use bumpalo::Bump;
use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};
use symdecode::{
    parse,
    DisplayOptions,
    ParseOptions,
};

/// A small corpus spanning the major symbol kinds: global/member
/// functions, static data, templates with back-referenced arguments,
/// vtables, and RTTI descriptors.
const CORPUS: &[&str] = &[
    "?wibble@@YAHH@Z",
    "??0Abc@@QAE@H@Z",
    "?var@@3NA",
    "?a@@3VAbc@Ns@@A",
    "?X@@3V?$TClass@D$0?0@@A",
    "?Abc@@6B@",
    "??_R0?AUAbc@@@8",
    "?id0@id1@@YA?AUid2@1@U21@Vid3@1@V3id4@@V01@Vid5@4@PAVid6@4@AAU21@Vid9@id8@id7@@AAPAV789@W4id10@89@PAW4id10@89@Tid11@89@PATid11@89@V64@4@Z",
];

fn parse_corpus(c: &mut Criterion) {
    c.bench_function("parse_corpus", |b| {
        b.iter(|| {
            let arena = Bump::new();
            for sym in CORPUS {
                let _ = black_box(parse(black_box(sym), ParseOptions::empty(), &arena));
            }
        });
    });
}

fn parse_and_display(c: &mut Criterion) {
    c.bench_function("parse_and_display", |b| {
        b.iter(|| {
            let arena = Bump::new();
            for sym in CORPUS {
                if let Ok(decoded) = parse(sym, ParseOptions::empty(), &arena) {
                    black_box(decoded.display(DisplayOptions::empty()));
                }
            }
        });
    });
}

criterion_group!(benches, parse_corpus, parse_and_display);
criterion_main!(benches);
