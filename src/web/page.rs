/// Chat client served at `/`. Connects back to `/ws` on whatever host served it.
pub const CHAT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>WebSocket Chat</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; }
        #chatbox { width: 50%; height: 300px; border: 1px solid #ccc; overflow-y: auto; margin: 20px auto; padding: 10px; }
        #message { width: 40%; padding: 5px; }
        #send { padding: 5px; }
    </style>
</head>
<body>
    <h2>Real-Time Chat</h2>
    <div id="chatbox"></div>
    <input type="text" id="message" placeholder="Type your message...">
    <button id="send">Send</button>

    <script>
        const scheme = window.location.protocol === "https:" ? "wss://" : "ws://";
        const ws = new WebSocket(scheme + window.location.host + "/ws");
        const chatbox = document.getElementById("chatbox");
        const messageInput = document.getElementById("message");
        const sendButton = document.getElementById("send");

        ws.onmessage = function(event) {
            const line = document.createElement("p");
            line.textContent = event.data;
            chatbox.appendChild(line);
            chatbox.scrollTop = chatbox.scrollHeight;
        };

        sendButton.onclick = function() {
            if (messageInput.value.trim() !== "") {
                ws.send(messageInput.value);
                messageInput.value = "";
            }
        };

        messageInput.addEventListener("keypress", function(event) {
            if (event.key === "Enter") {
                sendButton.click();
            }
        });
    </script>
</body>
</html>
"#;
