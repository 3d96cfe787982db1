//! Proxy and Reflect wrappers for reversible API interception.
//!
//! Every patch returns a `PatchGuard` holding the original property value and
//! the trap closure. The closure lives exactly as long as the guard, so a
//! restored API no longer routes through Rust.

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Signature shared by `apply` traps `(target, thisArg, args)` and
/// `construct` traps `(target, args, newTarget)`.
pub type TrapFn = dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>;

pub fn trap<F>(f: F) -> Closure<TrapFn>
where
    F: FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue> + 'static,
{
    Closure::wrap(Box::new(f) as Box<TrapFn>)
}

/// An installed patch that can put the original back.
pub struct PatchGuard {
    target: JsValue,
    prop: &'static str,
    original: JsValue,
    _trap: Closure<TrapFn>,
}

impl PatchGuard {
    pub fn prop(&self) -> &'static str {
        self.prop
    }

    /// Reinstate the original value. Consumes the guard and drops the trap.
    pub fn restore(self) -> Result<(), JsValue> {
        Reflect::set(&self.target, &JsValue::from_str(self.prop), &self.original)?;
        Ok(())
    }
}

impl std::fmt::Debug for PatchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchGuard").field("prop", &self.prop).finish()
    }
}

/// Get a property from the global scope.
pub fn get_global(prop: &str) -> Result<JsValue, JsValue> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(prop))
}

/// `Name.prototype` for a global constructor, if the constructor exists.
pub fn get_prototype(constructor_name: &str) -> Option<JsValue> {
    let ctor = get_global(constructor_name).ok()?;
    if ctor.is_undefined() || ctor.is_null() {
        return None;
    }
    Reflect::get(&ctor, &JsValue::from_str("prototype"))
        .ok()
        .filter(|p| p.is_object())
}

/// Whether `target[prop]` is callable.
pub fn has_function(target: &JsValue, prop: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(prop))
        .map(|v| v.is_function())
        .unwrap_or(false)
}

fn new_proxy(target: &JsValue, trap_name: &str, trap: &Closure<TrapFn>) -> Result<JsValue, JsValue> {
    let handler = Object::new();
    Reflect::set(&handler, &JsValue::from_str(trap_name), trap.as_ref())?;

    let proxy_ctor: Function = get_global("Proxy")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Proxy not found"))?;
    Reflect::construct(&proxy_ctor, &Array::of2(target, &handler))
}

fn install(
    target: &JsValue,
    prop: &'static str,
    trap_name: &str,
    trap: Closure<TrapFn>,
) -> Result<PatchGuard, JsValue> {
    let original = Reflect::get(target, &JsValue::from_str(prop))?;
    if !original.is_function() {
        return Err(JsValue::from_str(&format!("{} is not a function", prop)));
    }
    let proxied = new_proxy(&original, trap_name, &trap)?;
    Reflect::set(target, &JsValue::from_str(prop), &proxied)?;
    Ok(PatchGuard {
        target: target.clone(),
        prop,
        original,
        _trap: trap,
    })
}

/// Wrap `target[method]` in a Proxy with an `apply` trap. The trap's first
/// argument is the original function.
pub fn proxy_method(
    target: &JsValue,
    method: &'static str,
    apply_trap: Closure<TrapFn>,
) -> Result<PatchGuard, JsValue> {
    install(target, method, "apply", apply_trap)
}

/// Wrap the global constructor `name` in a Proxy with a `construct` trap.
/// `instanceof` keeps working because the Proxy forwards `prototype`.
pub fn proxy_constructor(
    name: &'static str,
    construct_trap: Closure<TrapFn>,
) -> Result<PatchGuard, JsValue> {
    install(&js_sys::global(), name, "construct", construct_trap)
}

/// Call a JS function with an arguments array via Reflect.apply.
pub fn call_function(func: &JsValue, this_arg: &JsValue, args: &JsValue) -> Result<JsValue, JsValue> {
    let func: &Function = func.unchecked_ref();
    Reflect::apply(func, this_arg, args.unchecked_ref())
}

/// Forward a `construct` trap to the real constructor.
pub fn construct_original(target: &JsValue, args: &JsValue, new_target: &JsValue) -> Result<JsValue, JsValue> {
    let ctor: &Function = target.unchecked_ref();
    let args: &Array = args.unchecked_ref();
    if new_target.is_function() {
        Reflect::construct_with_new_target(ctor, args, new_target.unchecked_ref())
    } else {
        Reflect::construct(ctor, args)
    }
}

/// `args[index]`, or undefined when out of range.
pub fn arg(args: &JsValue, index: u32) -> JsValue {
    let args: &Array = args.unchecked_ref();
    args.get(index)
}

pub fn arg_count(args: &JsValue) -> u32 {
    args.unchecked_ref::<Array>().length()
}

/// Build a `DOMException` with the given name. Falls back to a plain Error
/// where DOMException is missing.
pub fn dom_exception(message: &str, name: &str) -> JsValue {
    let built = get_global("DOMException")
        .ok()
        .and_then(|c| c.dyn_into::<Function>().ok())
        .and_then(|ctor| {
            Reflect::construct(
                &ctor,
                &Array::of2(&JsValue::from_str(message), &JsValue::from_str(name)),
            )
            .ok()
        });
    built.unwrap_or_else(|| js_sys::Error::new(message).into())
}
