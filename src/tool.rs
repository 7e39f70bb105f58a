//! 工具描述符
//!
//! 扁平化的 JSON Schema 子集：参数只描述一层对象属性，不支持嵌套。
//! parameters_schema 渲染出标准 schema 对象，供思维后端理解参数格式。

use serde_json::{json, Map, Value};

/// 工具描述（暴露给思维理解与选择）
#[derive(Clone, Debug, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// 为 false 时不对思维暴露
    pub enabled: bool,
    pub parameters: Vec<Parameter>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// 渲染参数列表为 JSON Schema 对象：properties 按参数名索引，required 收集必填项
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in &self.parameters {
            properties.insert(p.name.clone(), p.schema_value());
            if p.required {
                required.push(Value::String(p.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

/// 工具参数描述（扁平 JSON Schema 字段子集）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameter {
    /// 属性名
    pub name: String,
    /// JSON Schema 类型：string / number / integer / boolean 等
    pub kind: String,
    pub description: String,
    /// 友好属性名称，展示用
    pub title: String,
    pub required: bool,
    pub enum_values: Vec<String>,
    pub default: Option<Value>,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: String,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
    /// 数值必须是此值的整数倍
    pub multiple_of: Option<f64>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// 单个属性的 schema 片段；name 作外层键、required 汇总到外层，故此处不出现
    pub fn schema_value(&self) -> Value {
        let mut prop = Map::new();
        if !self.kind.is_empty() {
            prop.insert("type".to_string(), Value::String(self.kind.clone()));
        }
        if !self.description.is_empty() {
            prop.insert("description".to_string(), Value::String(self.description.clone()));
        }
        if !self.title.is_empty() {
            prop.insert("title".to_string(), Value::String(self.title.clone()));
        }
        if !self.enum_values.is_empty() {
            prop.insert("enum".to_string(), json!(self.enum_values));
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.clone());
        }
        if let Some(n) = self.max_length {
            prop.insert("maxLength".to_string(), json!(n));
        }
        if let Some(n) = self.min_length {
            prop.insert("minLength".to_string(), json!(n));
        }
        if !self.pattern.is_empty() {
            prop.insert("pattern".to_string(), Value::String(self.pattern.clone()));
        }
        if let Some(n) = self.maximum {
            prop.insert("maximum".to_string(), json!(n));
        }
        if let Some(n) = self.minimum {
            prop.insert("minimum".to_string(), json!(n));
        }
        if let Some(n) = self.multiple_of {
            prop.insert("multipleOf".to_string(), json!(n));
        }
        Value::Object(prop)
    }
}
