use criterion::{black_box, criterion_group, criterion_main, Criterion};
use promise_tracer_rs::sexp::{RawValue, SexpType};
use promise_tracer_rs::tracer::CallArgument;
use promise_tracer_rs::{AnalysisSwitch, BindingHandle, EnvironmentId, FunctionId, TraceEvent, Tracer};

/// Promises passed to a call, forced inside it and read again after it returns
fn escaping_trace(bindings: u64) -> Vec<TraceEvent> {
    let mut events = Vec::new();
    for binding in 0..bindings {
        let handle = BindingHandle(binding);
        events.push(TraceEvent::Create {
            binding: handle,
            value: RawValue::promise(RawValue::object(SexpType::Language), EnvironmentId(1)),
            local: true,
        });
        events.push(TraceEvent::CallEntry {
            function_id: FunctionId::new("f"),
            function_name: None,
            arguments: vec![CallArgument {
                binding: handle,
                formal_position: 0,
                actual_position: 0,
                is_default: false,
            }],
        });
        events.push(TraceEvent::ForceEntry { binding: handle });
        events.push(TraceEvent::ForceExit {
            binding: handle,
            value: RawValue::object(SexpType::Double),
            elapsed: 0.0,
            jumped: false,
        });
        events.push(TraceEvent::CallExit {
            return_value: RawValue::object(SexpType::Closure),
            jumped: false,
        });
        events.push(TraceEvent::ValueLookup { binding: handle });
    }
    events
}

fn replay_benchmark(c: &mut Criterion) {
    let events = escaping_trace(1_000);
    c.bench_function("replay_escaping_trace", |b| {
        b.iter(|| {
            let mut tracer = Tracer::new(AnalysisSwitch::default());
            tracer.replay(events.iter().cloned()).unwrap();
            black_box(tracer.finish());
        });
    });
}

criterion_group!(benches, replay_benchmark);
criterion_main!(benches);
