use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tinylisp::{Session, parse, parse_str, tokenize};

const NESTED_ARITHMETIC: &str = "(* 2 (+ 1 (* 3 (- 10 4) (/ 20 5)) (+ 1.5 2.5)))";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize nested arithmetic", |b| {
        b.iter(|| tokenize(black_box(NESTED_ARITHMETIC)))
    });
}

fn bench_parse(c: &mut Criterion) {
    let tokens = tokenize(NESTED_ARITHMETIC);
    c.bench_function("parse nested arithmetic", |b| {
        b.iter(|| parse(black_box(tokens.clone())).unwrap())
    });
}

fn bench_eval_arithmetic(c: &mut Criterion) {
    let session = Session::new();
    let node = parse_str(NESTED_ARITHMETIC).unwrap();
    c.bench_function("eval nested arithmetic", |b| {
        b.iter(|| session.execute(black_box(node.clone())).unwrap())
    });
}

fn bench_eval_recursive_closure(c: &mut Criterion) {
    let session = Session::new();
    session
        .eval("(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))")
        .unwrap();
    let call = parse_str("(fact 10)").unwrap();
    c.bench_function("eval (fact 10)", |b| {
        b.iter(|| session.execute(black_box(call.clone())).unwrap())
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_parse,
    bench_eval_arithmetic,
    bench_eval_recursive_closure
);
criterion_main!(benches);
