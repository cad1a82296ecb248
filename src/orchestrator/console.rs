//! 行式终端输入输出
//!
//! 只负责读一行、写一段文字，输入流结束时返回 None

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

use crate::error::{AppError, AppResult};

const STDIN: &str = "<stdin>";
const STDOUT: &str = "<stdout>";

/// 行式终端
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    /// 绑定到进程的标准输入输出
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    /// 输出一段文字并换行
    pub async fn say(&mut self, text: &str) -> AppResult<()> {
        self.write(text).await?;
        self.write("\n").await?;
        self.flush().await
    }

    /// 输出提示并读取一行
    ///
    /// # 返回
    /// 去掉行尾换行后的输入；输入流结束时返回 None
    pub async fn prompt(&mut self, label: &str) -> AppResult<Option<String>> {
        self.write(label).await?;
        self.flush().await?;

        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| AppError::file_read_failed(STDIN, e))?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }

    pub fn into_output(self) -> W {
        self.out
    }

    async fn write(&mut self, text: &str) -> AppResult<()> {
        self.out
            .write_all(text.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(STDOUT, e))
    }

    async fn flush(&mut self) -> AppResult<()> {
        self.out
            .flush()
            .await
            .map_err(|e| AppError::file_write_failed(STDOUT, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_reads_lines_until_eof() {
        let mut console = Console::new("first\r\n\nlast".as_bytes(), Vec::new());

        assert_eq!(console.prompt("> ").await.unwrap().as_deref(), Some("first"));
        assert_eq!(console.prompt("> ").await.unwrap().as_deref(), Some(""));
        assert_eq!(console.prompt("> ").await.unwrap().as_deref(), Some("last"));
        assert_eq!(console.prompt("> ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_say_appends_newline() {
        let mut console = Console::new("".as_bytes(), Vec::new());
        console.say("hello").await.unwrap();
        console.prompt("? ").await.unwrap();

        let out = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(out, "hello\n? ");
    }
}
