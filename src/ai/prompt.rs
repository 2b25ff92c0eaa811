use crate::ai::dto::ComposeEssayRequest;

/// Builds the generation request for an essay from the structured fields.
/// `additional_info` is untrusted free-form text and is passed to the
/// generation backend verbatim.
pub fn essay_request(request: &ComposeEssayRequest) -> String {
    format!(
        "\
Напиши сочинение на тему: {theme}
Автор: {author}
Количество РУССКИХ слов: {word_count}
Дополнительная информация: {additional_info}

Используй только русский язык.",
        theme = request.theme,
        author = request.author,
        // The model tends to undershoot, so ask for a padded count.
        word_count = request.word_count + 50,
        additional_info = request.additional_info.as_deref().unwrap_or(""),
    )
}
