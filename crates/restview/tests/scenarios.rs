use proptest::prelude::*;
use restview::prelude::*;
use restview::{RenderError, RendererRegistry, Stage, TemplateEngine};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
#[error("user {0} not found")]
struct UserNotFound(u64);

fn raw_site() -> Site {
    Site::builder().build()
}

// Scenario A: GET-only handler, no validator, result passed through unrendered
#[test]
fn test_get_only_handler_returns_raw_result() {
    let site = raw_site();
    let handler = site
        .handler("Index")
        .route("/")
        .get(|_ctx, params: Params| {
            assert!(params.is_empty());
            Ok::<_, anyhow::Error>(json!({"page": "index"}))
        })
        .build()
        .unwrap();

    assert_eq!(handler.capabilities().names(), vec!["GET"]);

    let output = handler
        .dispatch(&IncomingRequest::get(), PathArgs::new())
        .unwrap();
    assert_eq!(output, Output::Raw(json!({"page": "index"})));
}

fn get_put_handler(calls: Arc<Mutex<Vec<&'static str>>>) -> HandlerDefinition {
    let get_calls = calls.clone();
    let put_calls = calls;
    HandlerBuilder::new("Profile")
        .route("/profile")
        .method_override("__method__")
        .get(move |_ctx, _p: Params| {
            get_calls.lock().unwrap().push("get");
            Ok::<_, anyhow::Error>(json!("got"))
        })
        .put(move |_ctx, _p: Params| {
            put_calls.lock().unwrap().push("put");
            Ok::<_, anyhow::Error>(json!("updated"))
        })
        .build()
        .unwrap()
}

// Scenario B: POST with __method__=PUT invokes put
#[test]
fn test_method_override_invokes_put() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handler = get_put_handler(calls.clone());

    let req = IncomingRequest::post().with_form("__method__", "PUT");
    let output = handler.dispatch(&req, PathArgs::new()).unwrap();

    assert_eq!(output.raw(), Some(&json!("updated")));
    assert_eq!(*calls.lock().unwrap(), vec!["put"]);
}

// Scenario C: POST with __method__=DELETE on a GET/PUT handler
#[test]
fn test_method_override_to_unimplemented_verb() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handler = get_put_handler(calls.clone());

    let req = IncomingRequest::post().with_form("__method__", "DELETE");
    let err = handler.dispatch(&req, PathArgs::new()).unwrap_err();

    match &err {
        DispatchError::MethodNotAllowed { verb, allowed } => {
            assert_eq!(verb, "DELETE");
            assert_eq!(allowed.names(), vec!["GET", "PUT"]);
        }
        other => panic!("expected MethodNotAllowed, got {other:?}"),
    }
    assert_eq!(err.to_string(), "DELETE is an invalid method");
    assert!(calls.lock().unwrap().is_empty());
}

// Scenario D: format=json bypasses the template
#[test]
fn test_json_format_bypasses_template() {
    let template_calls = Arc::new(AtomicUsize::new(0));

    struct CountingEngine(Arc<AtomicUsize>);

    impl TemplateEngine for CountingEngine {
        fn render(&self, _name: &str, _context: &Value) -> Result<String, RenderError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("template".into())
        }

        fn has_template(&self, _name: &str) -> bool {
            true
        }
    }

    let received = Arc::new(Mutex::new(None));
    let sink = received.clone();
    let site = Site::builder()
        .template_engine(Arc::new(CountingEngine(template_calls.clone())))
        .renderer(
            "json",
            from_fn(move |data| {
                *sink.lock().unwrap() = Some(data.clone());
                Ok("json-body".into())
            }),
        )
        .build();

    let handler = site
        .handler("Profile")
        .route("/profile")
        .template("profile")
        .default_format("html")
        .get(|_ctx, _p: Params| Ok::<_, anyhow::Error>(json!({"name": "ada"})))
        .build()
        .unwrap();

    let req = IncomingRequest::get().with_query("format", "json");
    let output = handler.dispatch(&req, PathArgs::new()).unwrap();

    assert_eq!(output.body(), Some("json-body"));
    assert_eq!(*received.lock().unwrap(), Some(json!({"name": "ada"})));
    assert_eq!(template_calls.load(Ordering::SeqCst), 0);

    // Same handler without a format goes through the template
    let output = handler
        .dispatch(&IncomingRequest::get(), PathArgs::new())
        .unwrap();
    assert_eq!(output.body(), Some("template"));
    assert_eq!(template_calls.load(Ordering::SeqCst), 1);
}

// Scenario E: validator domain error, teardown exactly once, error unchanged
#[test]
fn test_validation_failure_runs_teardown_once() {
    let teardowns = Arc::new(Mutex::new(Vec::new()));
    let log = teardowns.clone();

    let hooks = Hooks::new().on_exit(move |ctx, failure| {
        log.lock()
            .unwrap()
            .push((ctx.stage(), failure.map(|e| e.to_string())));
    });

    let handler = HandlerBuilder::new("User")
        .route("/users/<id>")
        .hooks(hooks)
        .validate(Verb::Get, |_req: &dyn Request, args: &PathArgs| {
            let id = args.get("id").and_then(Value::as_u64).unwrap_or(0);
            Err::<Params, _>(UserNotFound(id))
        })
        .get(|_ctx, _p: Params| -> Result<Value, anyhow::Error> {
            panic!("business method must not run")
        })
        .build()
        .unwrap();

    let mut args = PathArgs::new();
    args.insert("id".into(), json!(42));
    let err = handler
        .dispatch(&IncomingRequest::get(), args)
        .unwrap_err();

    assert!(matches!(err, DispatchError::Validation(_)));
    assert_eq!(err.downcast_ref::<UserNotFound>().unwrap().0, 42);
    assert_eq!(
        *teardowns.lock().unwrap(),
        vec![(Stage::Failed, Some("user 42 not found".to_string()))]
    );
}

#[test]
fn test_derived_handler_keeps_parent_validator() {
    let base = HandlerBuilder::new("Signed").validate(
        Verb::Put,
        |req: &dyn Request, _args: &PathArgs| {
            let token = req
                .form("token")
                .ok_or_else(|| anyhow::anyhow!("missing token"))?;
            Ok::<_, anyhow::Error>(Params::named([("user", json!(token))]))
        },
    );

    let settings = base
        .clone()
        .name("Settings")
        .route("/settings")
        .renderer_defaults(Arc::new(RendererRegistry::new()))
        .put(|_ctx, params: Params| Ok::<_, anyhow::Error>(params.into_value()))
        .build()
        .unwrap();

    let req = IncomingRequest::post()
        .with_form("__method__", "PUT")
        .with_form("token", "ada");
    let output = settings.dispatch(&req, PathArgs::new()).unwrap();
    assert_eq!(output.raw(), Some(&json!({"user": "ada"})));

    let err = settings
        .dispatch(
            &IncomingRequest::post().with_form("__method__", "PUT"),
            PathArgs::new(),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "missing token");
}

#[test]
fn test_renderer_resolution_is_stable() {
    let site = raw_site();
    let handler = site
        .handler("Stable")
        .route("/stable")
        .template("stable")
        .build()
        .unwrap();

    for format in ["json", "yaml", "xml", "csv", "html"] {
        let req = IncomingRequest::get().with_query("format", format);
        let first = handler.resolve_renderer(&req).unwrap();
        let second = handler.resolve_renderer(&req).unwrap();
        assert_eq!(first.format(), second.format());
        assert_eq!(first.template(), second.template());
    }

    let req = IncomingRequest::get().with_query("format", "html");
    assert_eq!(
        handler.resolve_renderer(&req).unwrap().template(),
        Some("stable.html")
    );
}

#[test]
fn test_handlers_dispatch_concurrently() {
    let site = raw_site();
    let handler = site
        .handler("Counter")
        .route("/count/<n>")
        .get(|_ctx, params: Params| {
            let n = params.get("n").and_then(Value::as_u64).unwrap_or(0);
            Ok::<_, anyhow::Error>(json!({"double": n * 2}))
        })
        .build()
        .unwrap();

    std::thread::scope(|scope| {
        for n in 0..8u64 {
            let handler = &handler;
            scope.spawn(move || {
                let mut args = PathArgs::new();
                args.insert("n".into(), json!(n));
                let req = IncomingRequest::get().with_query("format", "json");
                let output = handler.dispatch(&req, args).unwrap();
                let parsed: Value = serde_json::from_str(output.body().unwrap()).unwrap();
                assert_eq!(parsed, json!({"double": n * 2}));
            });
        }
    });
}

fn verb_strategy() -> impl Strategy<Value = Verb> {
    prop::sample::select(Verb::ALL.to_vec())
}

fn counting_handler(verbs: &[Verb], calls: Arc<AtomicUsize>) -> HandlerDefinition {
    verbs
        .iter()
        .fold(
            HandlerBuilder::new("Prop").route("/prop"),
            |builder, &verb| {
                let calls = calls.clone();
                builder.method(verb, move |ctx, _p: Params| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(json!(ctx.verb().map(|v| v.as_str())))
                })
            },
        )
        .renderer_defaults(Arc::new(RendererRegistry::new()))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_unimplemented_verb_never_invokes_method(
        verbs in prop::collection::vec(verb_strategy(), 0..5),
        attempted in verb_strategy(),
        via_override in any::<bool>(),
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&verbs, calls.clone());

        let req = if via_override {
            IncomingRequest::post().with_form("__method__", attempted.as_str())
        } else {
            IncomingRequest::new(attempted.as_str())
        };
        let result = handler.dispatch(&req, PathArgs::new());

        if verbs.contains(&attempted) {
            prop_assert_eq!(result.unwrap(), Output::Raw(json!(attempted.as_str())));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        } else {
            prop_assert!(result.unwrap_err().is_method_not_allowed());
            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_method_receives_exactly_validator_params(
        values in prop::collection::vec(any::<i64>(), 0..6),
        id in any::<u32>(),
    ) {
        let returned = Params::positional(values.iter().map(|v| json!(v)));
        let expected = returned.clone();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let handler = HandlerBuilder::new("Exact")
            .route("/exact/<id>")
            .validate(Verb::Get, move |_req: &dyn Request, _args: &PathArgs| {
                Ok::<_, anyhow::Error>(returned.clone())
            })
            .get(move |_ctx, params: Params| {
                *sink.lock().unwrap() = Some(params);
                Ok::<_, anyhow::Error>(())
            })
            .build()
            .unwrap();

        let mut args = PathArgs::new();
        args.insert("id".into(), json!(id));
        handler.dispatch(&IncomingRequest::get(), args).unwrap();

        prop_assert_eq!(seen.lock().unwrap().clone(), Some(expected));
    }

    #[test]
    fn test_teardown_runs_exactly_once(
        attempted in verb_strategy(),
        fail_handler in any::<bool>(),
    ) {
        let exits = Arc::new(AtomicUsize::new(0));
        let counter = exits.clone();
        let hooks = Hooks::new().on_exit(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handler = HandlerBuilder::new("Once")
            .route("/once")
            .hooks(hooks)
            .get(move |_ctx, _p: Params| {
                if fail_handler {
                    Err(anyhow::anyhow!("boom"))
                } else {
                    Ok(json!(1))
                }
            })
            .build()
            .unwrap();

        let _ = handler.dispatch(&IncomingRequest::new(attempted.as_str()), PathArgs::new());
        prop_assert_eq!(exits.load(Ordering::SeqCst), 1);
    }
}
