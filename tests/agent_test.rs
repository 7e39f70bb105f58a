//! 编排协议集成测试
//!
//! 全部走公开 API：脚本化思维驱动编排循环，内存记忆承接落库，
//! 工具包能力承接分发。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use waggle::adapters::{ScriptMind, SimpleMemory, Toolkit, ToolkitTool};
use waggle::{
    Agent, AgentError, AbilityHandler, CallToolOptions, Content, InteractInput, Message, Memory,
    MemoryHandler, Meta, MindCallOptions, MindCallResponse, MindHandler, Parameter, Role, Tool,
    ToolCall, ToolCallArguments,
};

fn assistant_text(text: &str) -> MindCallResponse {
    MindCallResponse {
        message: Message::assistant(text),
    }
}

fn assistant_with_call(id: &str, tool_id: &str, args: &str) -> MindCallResponse {
    let mut message = Message::new(Role::Assistant, Vec::new());
    message.tool_calls.push(ToolCall {
        id: id.to_string(),
        tool_id: tool_id.to_string(),
        arguments: ToolCallArguments::from_json(args),
    });
    MindCallResponse { message }
}

struct EchoTool;

#[async_trait::async_trait]
impl ToolkitTool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "原样返回 text 参数"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::new("text", "string").required()]
    }

    async fn call(&self, arguments: &ToolCallArguments, _meta: &Meta) -> waggle::Result<Message> {
        let text = arguments
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(Message::tool(text))
    }
}

struct SearchTool {
    reply: &'static str,
    hits: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ToolkitTool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "搜索"
    }

    async fn call(&self, _arguments: &ToolCallArguments, _meta: &Meta) -> waggle::Result<Message> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(Message::tool(self.reply))
    }
}

struct BrokenAbility;

#[async_trait::async_trait]
impl AbilityHandler for BrokenAbility {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        ""
    }

    async fn tools(&self) -> waggle::Result<Vec<Tool>> {
        Err(anyhow::anyhow!("listing failed").into())
    }

    async fn call_tool(&self, _options: &CallToolOptions) -> waggle::Result<Message> {
        Ok(Message::tool(""))
    }
}

#[tokio::test]
async fn test_terminates_after_single_turn() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![assistant_text("你好")]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let output = agent
        .interact(InteractInput {
            session_id: None,
            messages: vec![Message::system("你是助手"), Message::user("在吗")],
            message_limit: None,
        })
        .await
        .unwrap();

    assert_eq!(output.message.text(), "你好");
    assert!(output.skipped.is_empty());
    assert_eq!(mind.calls().len(), 1);
    // 输入消息先于回复逐条落库
    let history = agent.list_messages(&output.session_id, None).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::System);
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[2].role, Role::Assistant);
}

#[tokio::test]
async fn test_tool_call_round_trip_in_order() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![
        assistant_with_call("call-1", "0-echo", r#"{"text":"收到"}"#),
        assistant_text("搜完了"),
    ]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));
    agent
        .grant_ability(Arc::new(Toolkit::new("demo", "").with_tool(EchoTool)))
        .await
        .unwrap();

    let output = agent.send(None, "回显一下").await.unwrap();

    assert_eq!(output.message.text(), "搜完了");
    assert!(output.skipped.is_empty());
    assert_eq!(mind.calls().len(), 2);
    // 第二轮思维的历史里已经有工具结果
    assert_eq!(mind.calls()[1].messages.len(), 3);

    let history = agent.list_messages(&output.session_id, None).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].tool_calls.len(), 1);
    assert_eq!(history[2].role, Role::Tool);
    assert_eq!(history[2].tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(history[2].text(), "收到");
    assert_eq!(history[3].role, Role::Assistant);
}

#[tokio::test]
async fn test_flat_ids_address_the_right_binding() {
    let alpha_hits = Arc::new(AtomicUsize::new(0));
    let beta_hits = Arc::new(AtomicUsize::new(0));
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![
        assistant_with_call("call-1", "1-search", "{}"),
        assistant_text("完"),
    ]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));
    let kits: Vec<Arc<dyn AbilityHandler>> = vec![
        Arc::new(Toolkit::new("alpha", "").with_tool(SearchTool {
            reply: "来自 alpha",
            hits: alpha_hits.clone(),
        })),
        Arc::new(Toolkit::new("beta", "").with_tool(SearchTool {
            reply: "来自 beta",
            hits: beta_hits.clone(),
        })),
    ];
    agent.grant_abilities(kits).await.unwrap();

    let output = agent.send(None, "搜").await.unwrap();

    // 同名工具在不同绑定下得到不同的扁平 ID
    let calls = mind.calls();
    let ids: Vec<&str> = calls[0].tools.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["0-search", "1-search"]);
    // "1-search" 只命中第二个绑定
    assert_eq!(alpha_hits.load(Ordering::SeqCst), 0);
    assert_eq!(beta_hits.load(Ordering::SeqCst), 1);
    let history = agent.list_messages(&output.session_id, None).await.unwrap();
    assert_eq!(history[2].text(), "来自 beta");
}

#[tokio::test]
async fn test_skipped_tool_calls_recorded_not_fatal() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![
        {
            let mut message = Message::new(Role::Assistant, Vec::new());
            message.tool_calls.push(ToolCall {
                id: "bad-1".to_string(),
                tool_id: "oops".to_string(),
                arguments: ToolCallArguments::new(),
            });
            message.tool_calls.push(ToolCall {
                id: "call-2".to_string(),
                tool_id: "0-echo".to_string(),
                arguments: ToolCallArguments::from_json(r#"{"text":"好"}"#),
            });
            MindCallResponse { message }
        },
        assistant_text("继续"),
    ]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));
    agent
        .grant_ability(Arc::new(Toolkit::new("demo", "").with_tool(EchoTool)))
        .await
        .unwrap();

    let output = agent.send(None, "试试").await.unwrap();

    assert_eq!(output.message.text(), "继续");
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].tool_call.id, "bad-1");
    assert!(output.skipped[0].reason.contains("malformed tool id"));
    // 坏 ID 不产生工具结果消息，好的照常落库
    let history = agent.list_messages(&output.session_id, None).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].role, Role::Tool);
    assert_eq!(history[2].tool_call_id.as_deref(), Some("call-2"));
}

#[tokio::test]
async fn test_empty_history_rejected_before_mind_call() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let err = agent
        .interact(InteractInput {
            session_id: None,
            messages: vec![],
            message_limit: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::EmptyConversation));
    assert!(mind.calls().is_empty());
}

#[tokio::test]
async fn test_missing_memory_aborts_before_mind() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![assistant_text("不该到这")]));
    agent.grant_mind(mind.clone());

    let err = agent.send(None, "在吗").await.unwrap_err();

    assert!(matches!(err, AgentError::HandlerNotDefined("memory")));
    assert!(mind.calls().is_empty());
}

#[tokio::test]
async fn test_missing_mind_aborts_after_input_persisted() {
    let agent = Agent::new();
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let err = agent.send(Some("s".to_string()), "在吗").await.unwrap_err();

    assert!(matches!(err, AgentError::HandlerNotDefined("mind")));
    // 输入按协议先落库
    let stored = agent.list_messages("s", None).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_empty_mind_message_is_no_response() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![MindCallResponse {
        message: Message::new(Role::Assistant, Vec::new()),
    }]));
    agent.grant_mind(mind);
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let err = agent.send(Some("s".to_string()), "说点什么").await.unwrap_err();

    assert!(matches!(err, AgentError::NoResponse));
    // 空响应不落库
    assert_eq!(agent.list_messages("s", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_talk_concatenates_text_and_assigns_session() {
    let agent = Agent::new();
    let mut reply = Message::assistant("你好");
    reply.contents.push(Content::image("https://example.com/p.png"));
    reply.contents.push(Content::text("，世界"));
    agent.grant_mind(Arc::new(ScriptMind::new(vec![MindCallResponse {
        message: reply,
    }])));
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let (session_id, text) = agent.talk(None, "打个招呼").await.unwrap();

    assert_eq!(text, "你好，世界");
    assert!(uuid::Uuid::parse_str(&session_id).is_ok());
}

#[tokio::test]
async fn test_seeded_history_visible_to_mind() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![assistant_text("好")]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    agent
        .add_messages("s", &[Message::system("用中文回答")])
        .await
        .unwrap();
    agent.send(Some("s".to_string()), "你好").await.unwrap();

    // 预置的系统消息进入推理历史
    assert_eq!(mind.calls()[0].messages.len(), 2);
    assert_eq!(mind.calls()[0].messages[0].role, Role::System);
}

#[tokio::test]
async fn test_session_id_preserved_and_history_accumulates() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![
        assistant_text("第一"),
        assistant_text("第二"),
    ]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let first = agent.send(Some("fixed".to_string()), "一").await.unwrap();
    assert_eq!(first.session_id, "fixed");
    let second = agent.send(Some("fixed".to_string()), "二").await.unwrap();
    assert_eq!(second.session_id, "fixed");

    assert!(agent.has_session("fixed").await.unwrap());
    assert_eq!(agent.list_messages("fixed", None).await.unwrap().len(), 4);
    // 第二轮思维看到之前的完整历史
    assert_eq!(mind.calls()[1].messages.len(), 3);
}

#[tokio::test]
async fn test_grant_batch_aborts_but_keeps_prior() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![assistant_text("好")]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));

    let batch: Vec<Arc<dyn AbilityHandler>> = vec![
        Arc::new(Toolkit::new("第一", "").with_tool(SearchTool {
            reply: "x",
            hits: Arc::new(AtomicUsize::new(0)),
        })),
        Arc::new(BrokenAbility),
        Arc::new(Toolkit::new("第三", "").with_tool(SearchTool {
            reply: "y",
            hits: Arc::new(AtomicUsize::new(0)),
        })),
    ];
    assert!(agent.grant_abilities(batch).await.is_err());

    agent.send(None, "看看工具").await.unwrap();
    // 失败项之前的绑定保留，之后的不注册
    let calls = mind.calls();
    let ids: Vec<&str> = calls[0].tools.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["0-search"]);
}

#[tokio::test]
async fn test_reset_abilities_replaces_bindings() {
    let agent = Agent::new();
    let mind = Arc::new(ScriptMind::new(vec![
        assistant_text("一"),
        assistant_text("二"),
    ]));
    agent.grant_mind(mind.clone());
    agent.grant_memory(Arc::new(SimpleMemory::new(0)));
    agent
        .grant_ability(Arc::new(Toolkit::new("old", "").with_tool(SearchTool {
            reply: "",
            hits: Arc::new(AtomicUsize::new(0)),
        })))
        .await
        .unwrap();
    agent.send(None, "先看").await.unwrap();

    agent
        .reset_abilities(vec![Arc::new(Toolkit::new("new", "").with_tool(EchoTool))])
        .await
        .unwrap();
    agent.send(None, "再看").await.unwrap();

    let calls = mind.calls();
    let first: Vec<&str> = calls[0].tools.iter().map(|t| t.id.as_str()).collect();
    let second: Vec<&str> = calls[1].tools.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(first, vec!["0-search"]);
    assert_eq!(second, vec!["0-echo"]);
}

/// 记录每次写入所属会话的记忆，用于断言交互不交错
struct LogMemory {
    inner: SimpleMemory,
    writes: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl MemoryHandler for LogMemory {
    async fn add_message(&self, session_id: &str, message: &Message) -> waggle::Result<()> {
        self.writes.lock().unwrap().push(session_id.to_string());
        self.inner.add_message(session_id, message).await
    }

    async fn list_messages(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> waggle::Result<Vec<Message>> {
        self.inner.list_messages(session_id, limit).await
    }

    async fn has_session(&self, session_id: &str) -> waggle::Result<bool> {
        self.inner.has_session(session_id).await
    }
}

struct SleepyMind;

#[async_trait::async_trait]
impl MindHandler for SleepyMind {
    async fn call(&self, _options: &MindCallOptions) -> waggle::Result<MindCallResponse> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(assistant_text("好"))
    }
}

#[tokio::test]
async fn test_concurrent_interactions_do_not_interleave() {
    let memory = Arc::new(LogMemory {
        inner: SimpleMemory::new(0),
        writes: Mutex::new(Vec::new()),
    });
    let agent = Arc::new(Agent::new());
    agent.grant_mind(Arc::new(SleepyMind));
    agent.grant_memory(memory.clone());

    let first = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.send(Some("a".to_string()), "一").await })
    };
    let second = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.send(Some("b".to_string()), "二").await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let order = memory.writes.lock().unwrap().clone();
    assert_eq!(order.len(), 4);
    // 回合锁串行化：先进入的一方写满（输入 + 回复）两条，另一方才开始写
    assert_eq!(order[0], order[1]);
    assert_eq!(order[2], order[3]);
    assert_ne!(order[1], order[2]);
}

// Memory 门面独立于编排器也要守住未挂载处理器的错误
#[tokio::test]
async fn test_memory_facade_guard_without_agent() {
    let memory = Memory::new();
    let err = memory.list_messages("s", None).await.unwrap_err();
    assert_eq!(err.to_string(), "memory handler is not defined");
}
