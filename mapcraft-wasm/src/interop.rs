use js_sys::{Float32Array, Object, Reflect, Uint32Array};
use serde::Serialize;
use wasm_bindgen::JsValue;

/// Plain object from `(key, value)` pairs; `undefined` values are left out.
pub fn obj(entries: &[(&str, JsValue)]) -> JsValue {
    let o = Object::new();
    for (k, v) in entries.iter().filter(|(_, v)| !v.is_undefined()) {
        let _ = Reflect::set(&o, &JsValue::from_str(k), v);
    }
    o.into()
}

/// Flat coordinate list for the renderer.
pub fn coords(flat: &[f32]) -> Float32Array {
    Float32Array::from(flat)
}

pub fn ids(ids: &[u32]) -> Uint32Array {
    Uint32Array::from(ids)
}

/// Plain JS objects (not `Map`s) and `null` for `None`, so the host can JSON.stringify the result.
pub fn to_js<T: Serialize + ?Sized>(v: &T) -> JsValue {
    v.serialize(&serde_wasm_bindgen::Serializer::json_compatible()).unwrap_or(JsValue::NULL)
}
