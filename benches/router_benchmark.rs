use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use webrouter::{query, HttpRequestMethod, PathPattern, Request, Response, Router};

/// 构造含 `size` 个资源的路由表，每个资源注册集合与成员两条路由
fn build_router(size: usize) -> Router {
    let mut router = Router::new();
    for i in 0..size {
        router
            .get(&format!("/resource{}", i), |_, _, res| {
                res.set_text("list");
            })
            .unwrap()
            .get(&format!("/resource{}/:id/child/:child_id", i), |ctx, _, res| {
                res.set_text(ctx.param("id").unwrap_or_default());
            })
            .unwrap();
    }
    router
}

fn pattern_compile_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_compile");

    let templates = [
        ("static", "/items"),
        ("one_param", "/items/:id"),
        ("three_params", "/users/:user_id/items/:item_id/tags/:tag"),
    ];

    for (name, template) in templates.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), template, |b, template| {
            b.iter(|| PathPattern::compile(black_box(template)).unwrap());
        });
    }

    group.finish();
}

fn router_find_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_find_last_route");

    for size in [1usize, 10, 100].iter() {
        let router = build_router(*size);
        let url = format!("/resource{}/42/child/7?sort=desc", size - 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &url, |b, url| {
            b.iter(|| router.find(HttpRequestMethod::Get, black_box(url)).unwrap());
        });
    }

    group.finish();
}

fn router_miss_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_miss");

    for size in [10usize, 100].iter() {
        let router = build_router(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let found = router.find(HttpRequestMethod::Get, black_box("/nowhere/at/all"));
                let allowed = router.allowed_methods(black_box("/nowhere/at/all"));
                (found.is_none(), allowed.len())
            });
        });
    }

    group.finish();
}

fn router_dispatch_benchmark(c: &mut Criterion) {
    let router = build_router(10);
    let request =
        Request::try_from(b"GET /resource5/abc/child/def?x=1 HTTP/1.1\r\nHost: localhost\r\n\r\n", 0)
            .unwrap();

    c.bench_function("router_dispatch", |b| {
        b.iter(|| {
            let mut response = Response::new();
            router.dispatch(black_box(&request), &mut response, 0)
        });
    });
}

fn query_decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_decode");

    let raw = "?name=hello%20world&flag&tag=a&tag=b&empty=&sort=desc";
    group.bench_function("raw", |b| {
        b.iter(|| query::decode_with(black_box(raw), false));
    });
    group.bench_function("percent_decoded", |b| {
        b.iter(|| query::decode_with(black_box(raw), true));
    });

    group.finish();
}

criterion_group!(
    benches,
    pattern_compile_benchmark,
    router_find_benchmark,
    router_miss_benchmark,
    router_dispatch_benchmark,
    query_decode_benchmark
);
criterion_main!(benches);
